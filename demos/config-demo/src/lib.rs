//! 配置类演示
//!
//! `AppConfig` 声明两个 Bean 方法 `foo` 和 `eoo`。`eoo` 通过容器获取 `Foo`，
//! 因此拿到的是容器里的单例，而不是重新调用 `foo()` 创建的新实例。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use sprig_core::prelude::*;
use sprig_core_macros::configuration;

/// 进程内唯一的实例标识
fn next_identity() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug)]
pub struct Foo {
    identity: u64,
}

impl Foo {
    pub fn new() -> Self {
        Self {
            identity: next_identity(),
        }
    }

    pub fn identity(&self) -> u64 {
        self.identity
    }
}

impl Default for Foo {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct Eoo {
    identity: u64,
}

impl Eoo {
    pub fn new() -> Self {
        Self {
            identity: next_identity(),
        }
    }

    pub fn identity(&self) -> u64 {
        self.identity
    }
}

impl Default for Eoo {
    fn default() -> Self {
        Self::new()
    }
}

/// 输出行的收集器
///
/// 记录每一行输出，`echo` 为 true 时同时打印到 stdout
#[derive(Debug, Default)]
pub struct Report {
    lines: Mutex<Vec<String>>,
    echo: bool,
}

impl Report {
    /// 打印到 stdout 并记录
    pub fn stdout() -> Self {
        Self {
            lines: Mutex::new(Vec::new()),
            echo: true,
        }
    }

    /// 只记录，不打印
    pub fn capture() -> Self {
        Self::default()
    }

    pub fn line(&self, line: impl Into<String>) {
        let line = line.into();
        if self.echo {
            println!("{}", line);
        }
        self.lines.lock().push(line);
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

pub struct AppConfig {
    report: Arc<Report>,
}

impl AppConfig {
    pub fn new(report: Arc<Report>) -> Self {
        Self { report }
    }
}

#[configuration]
impl AppConfig {
    #[bean]
    pub fn foo(&self) -> Foo {
        self.report.line("foo() invoked...");
        let foo = Foo::new();
        self.report
            .line(format!("foo() in foo() hashcode: {}", foo.identity()));
        foo
    }

    /// 通过容器获取 Foo，得到的是单例
    #[bean]
    pub fn eoo(&self, beans: &dyn BeanFactory) -> ContainerResult<Eoo> {
        self.report.line("eoo() invoked...");
        let foo = beans.get_bean_by_type::<Foo>()?;
        self.report
            .line(format!("foo() in eoo() hashcode: {}", foo.identity()));
        Ok(Eoo::new())
    }
}

/// 启动容器并报告所有应用 Bean 的名称
pub fn bootstrap(report: Arc<Report>) -> ApplicationResult<Arc<ApplicationContext>> {
    let context = SprigApplication::new("config-demo")
        .logging(LoggingConfig::new().level(LogLevel::Warn))
        .configuration(AppConfig::new(Arc::clone(&report)))
        .run()?;

    let names = context.get_bean_definition_names();
    tracing::debug!("Reporting {} application bean(s)", names.len());
    for name in names {
        report.line(name);
    }

    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identities_are_unique() {
        let first = Foo::new();
        let second = Foo::new();
        let eoo = Eoo::new();

        assert_ne!(first.identity(), second.identity());
        assert_ne!(second.identity(), eoo.identity());
    }

    #[test]
    fn test_direct_calls_create_new_instances() {
        let report = Arc::new(Report::capture());
        let config = AppConfig::new(Arc::clone(&report));

        let first = config.foo();
        let second = config.foo();

        assert_ne!(first.identity(), second.identity());
        assert_eq!(
            report.lines(),
            vec![
                "foo() invoked...".to_string(),
                format!("foo() in foo() hashcode: {}", first.identity()),
                "foo() invoked...".to_string(),
                format!("foo() in foo() hashcode: {}", second.identity()),
            ]
        );
    }

    #[test]
    fn test_capture_does_not_echo() {
        let report = Report::capture();
        report.line("quiet");
        assert_eq!(report.lines(), vec!["quiet"]);
    }
}
