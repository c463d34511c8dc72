use std::io;

/// 终端模式：渲染前启用转义序列解析，渲染后恢复
pub trait Console {
    fn enable(&mut self) -> io::Result<()>;
    fn restore(&mut self) -> io::Result<()>;
}

/// 终端原生支持 ANSI 转义序列，无需切换
#[derive(Debug, Default)]
pub struct Passthrough;

impl Console for Passthrough {
    fn enable(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Windows 控制台：打开 ENABLE_VIRTUAL_TERMINAL_PROCESSING
#[cfg(windows)]
#[derive(Debug, Default)]
pub struct VirtualTerminal {
    saved: Option<u32>,
}

#[cfg(windows)]
impl VirtualTerminal {
    const ENABLE_VIRTUAL_TERMINAL_PROCESSING: u32 = 0x0004;

    fn console_mode() -> io::Result<crossterm_winapi::ConsoleMode> {
        let handle = crossterm_winapi::Handle::current_out_handle()?;
        Ok(crossterm_winapi::ConsoleMode::from(handle))
    }
}

#[cfg(windows)]
impl Console for VirtualTerminal {
    fn enable(&mut self) -> io::Result<()> {
        let mode = Self::console_mode()?;
        let original = mode.mode()?;
        if original & Self::ENABLE_VIRTUAL_TERMINAL_PROCESSING == 0 {
            mode.set_mode(original | Self::ENABLE_VIRTUAL_TERMINAL_PROCESSING)?;
            self.saved = Some(original);
        }
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        if let Some(original) = self.saved.take() {
            Self::console_mode()?.set_mode(original)?;
        }
        Ok(())
    }
}

#[cfg(windows)]
pub fn platform_console() -> VirtualTerminal {
    VirtualTerminal::default()
}

#[cfg(not(windows))]
pub fn platform_console() -> Passthrough {
    Passthrough
}

/// 持有终端模式，离开作用域时恢复
pub struct ConsoleGuard<C: Console> {
    console: C,
}

impl<C: Console> ConsoleGuard<C> {
    pub fn acquire(mut console: C) -> Self {
        // 输出重定向到文件时没有控制台，照常输出即可
        if let Err(e) = console.enable() {
            tracing::debug!("Console mode unchanged: {}", e);
        }
        Self { console }
    }
}

impl<C: Console> Drop for ConsoleGuard<C> {
    fn drop(&mut self) {
        if let Err(e) = self.console.restore() {
            tracing::warn!("Failed to restore console mode: {}", e);
        }
    }
}
