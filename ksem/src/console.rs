//! # 控制台与日志模块
//!
//! ## Overview
//! 本模块把 `log` 门面接到宿主提供的字符控制台上，
//! 并导出 `print!` / `println!` 宏。
//!
//! ## Behavior
//! - 宿主通过 [`init`] 安装 [`Console`]，此前的输出全部丢弃
//! - 日志级别在编译期由环境变量 `LOG` 决定，缺省关闭

use core::fmt::{self, Write};
use log::{Level, LevelFilter, Log, Metadata, Record};
use spin::Once;

/// 宿主提供的字符输出设备
pub trait Console: Send + Sync {
    fn putchar(&self, c: u8);
    fn flush(&self) {}
}

static CONSOLE: Once<&'static dyn Console> = Once::new();

struct Stdout;

impl Write for Stdout {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if let Some(console) = CONSOLE.get() {
            for c in s.bytes() {
                console.putchar(c);
            }
            console.flush();
        }
        Ok(())
    }
}

pub fn print(args: fmt::Arguments) {
    // Stdout 本身不会失败
    let _ = Stdout.write_fmt(args);
}

#[macro_export]
macro_rules! print {
    ($fmt: literal $(, $($arg: tt)+)?) => {
        $crate::console::print(format_args!($fmt $(, $($arg)+)?))
    }
}

#[macro_export]
macro_rules! println {
    ($fmt: literal) => {
        $crate::console::print(format_args!(concat!($fmt, "\n")))
    };
    ($fmt: literal, $($arg: tt)*) => {
        $crate::console::print(format_args!(concat!($fmt, "\n"), $($arg)*))
    };
}

/// 安装控制台并注册全局 logger
///
/// 若其他 logger 已经注册（例如测试环境），仅安装控制台。
pub fn init(console: &'static dyn Console) {
    static LOGGER: Logger = Logger;
    CONSOLE.call_once(|| console);
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(max_level());
    }
}

fn max_level() -> LevelFilter {
    match option_env!("LOG") {
        Some("error") => LevelFilter::Error,
        Some("warn") => LevelFilter::Warn,
        Some("info") => LevelFilter::Info,
        Some("debug") => LevelFilter::Debug,
        Some("trace") => LevelFilter::Trace,
        _ => LevelFilter::Off,
    }
}

struct Logger;

impl Log for Logger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        println!(
            "\x1b[{}m[{:>5}] {}\x1b[0m",
            level_to_color_code(record.level()),
            record.level(),
            record.args()
        );
    }

    fn flush(&self) {}
}

fn level_to_color_code(level: Level) -> u8 {
    match level {
        Level::Error => 31, // Red
        Level::Warn => 93,  // BrightYellow
        Level::Info => 34,  // Blue
        Level::Debug => 32, // Green
        Level::Trace => 90, // BrightBlack
    }
}
