use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use sprig_core::prelude::*;
use sprig_core_macros::configuration;

#[derive(Debug)]
struct Database {
    url: String,
    connected: bool,
}

impl Database {
    fn connect(&mut self) {
        self.connected = true;
    }
}

#[derive(Debug)]
struct Repository {
    database: Arc<Database>,
}

struct Ticket(usize);

#[derive(Default)]
struct Events {
    log: Mutex<Vec<String>>,
}

impl Events {
    fn push(&self, event: impl Into<String>) {
        self.log.lock().push(event.into());
    }
}

struct Pool {
    events: Arc<Events>,
}

impl Pool {
    fn init(&mut self) -> ContainerResult<()> {
        self.events.push("pool init");
        Ok(())
    }

    fn close(&mut self) {
        self.events.push("pool close");
    }
}

struct StorageConfig {
    url: String,
    tickets: AtomicUsize,
    events: Arc<Events>,
}

impl StorageConfig {
    fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            tickets: AtomicUsize::new(0),
            events: Arc::new(Events::default()),
        }
    }
}

#[configuration]
impl StorageConfig {
    #[bean]
    #[init("connect")]
    fn database(&self) -> Database {
        self.events.push("database");
        Database {
            url: self.url.clone(),
            connected: false,
        }
    }

    #[bean("userRepository")]
    fn repository(&self, beans: &dyn BeanFactory) -> ContainerResult<Repository> {
        self.events.push("repository");
        Ok(Repository {
            database: beans.get_bean_by_type::<Database>()?,
        })
    }

    #[bean]
    #[scope("prototype")]
    fn ticket(&self) -> Ticket {
        Ticket(self.tickets.fetch_add(1, Ordering::SeqCst))
    }

    #[bean]
    #[lazy]
    #[init]
    #[destroy("close")]
    fn pool(&self) -> Pool {
        self.events.push("pool");
        Pool {
            events: Arc::clone(&self.events),
        }
    }

    /// 普通方法不会被注册
    fn describe(&self) -> String {
        format!("storage at {}", self.url)
    }
}

fn context() -> Arc<ApplicationContext> {
    ApplicationContext::builder().build().unwrap()
}

#[test]
fn test_bean_methods_registered_in_declaration_order() {
    let context = context();
    let config = context
        .register_configuration(StorageConfig::new("mem://"))
        .unwrap();

    assert_eq!(
        context.get_bean_definition_names(),
        vec!["database", "userRepository", "ticket", "pool"]
    );
    assert!(context.contains_bean("storageConfig"));
    assert_eq!(config.describe(), "storage at mem://");
}

#[test]
fn test_refresh_creates_eager_singletons_in_order() {
    let context = context();
    let config = context
        .register_configuration(StorageConfig::new("mem://"))
        .unwrap();

    context.refresh().unwrap();

    assert_eq!(*config.events.log.lock(), vec!["database", "repository"]);

    let database = context.get_bean_by_type::<Database>().unwrap();
    assert!(database.connected);
    assert_eq!(database.url, "mem://");

    let repository = context.get_typed_bean::<Repository>("userRepository").unwrap();
    assert!(Arc::ptr_eq(&repository.database, &database));
}

#[test]
fn test_prototype_bean_method() {
    let context = context();
    context
        .register_configuration(StorageConfig::new("mem://"))
        .unwrap();
    context.refresh().unwrap();

    let first = context.get_bean_by_type::<Ticket>().unwrap();
    let second = context.get_bean_by_type::<Ticket>().unwrap();
    assert_eq!(first.0, 0);
    assert_eq!(second.0, 1);
}

#[test]
fn test_lazy_bean_with_lifecycle_callbacks() {
    let context = context();
    let config = context
        .register_configuration(StorageConfig::new("mem://"))
        .unwrap();
    context.refresh().unwrap();

    assert!(!config.events.log.lock().contains(&"pool".to_string()));

    drop(context.get_bean_by_type::<Pool>().unwrap());
    context.shutdown().unwrap();

    let log = config.events.log.lock().clone();
    assert_eq!(
        &log[2..],
        &["pool".to_string(), "pool init".to_string(), "pool close".to_string()]
    );
}

struct NamedConfig;

#[derive(Debug)]
struct Port(u16);

#[configuration("customName")]
impl NamedConfig {
    #[bean]
    fn port(&self) -> Result<Port, anyhow::Error> {
        Ok(Port(8080))
    }

    #[bean]
    #[lazy]
    fn broken(&self) -> Result<String, anyhow::Error> {
        Err(anyhow::anyhow!("disk unavailable"))
    }
}

#[test]
fn test_custom_configuration_name() {
    assert_eq!(NamedConfig::configuration_name(), "customName");

    let context = context();
    context.register_configuration(NamedConfig).unwrap();
    assert!(context.contains_bean("customName"));
}

#[test]
fn test_result_returning_bean_methods() {
    let context = context();
    context.register_configuration(NamedConfig).unwrap();
    context.refresh().unwrap();

    assert_eq!(context.get_bean_by_type::<Port>().unwrap().0, 8080);

    match context.get_bean("broken") {
        Err(ContainerError::BeanCreationFailed(message)) => {
            assert!(message.starts_with("broken: "));
            assert!(message.contains("disk unavailable"));
        }
        other => panic!("Expected BeanCreationFailed, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_duplicate_configuration_is_rejected() {
    let context = context();
    context.register_configuration(NamedConfig).unwrap();

    assert!(matches!(
        context.register_configuration(NamedConfig),
        Err(ContainerError::BeanAlreadyExists(name)) if name == "customName"
    ));
}

#[test]
fn test_application_runner_registers_configurations() {
    let context = SprigApplication::new("storage")
        .config_files(Vec::new())
        .env_prefix("SPRIG_CONFIGURATION_TEST_")
        .logging(LoggingConfig::new().level(LogLevel::Error))
        .configuration(StorageConfig::new("file://data"))
        .configuration(NamedConfig)
        .run()
        .unwrap();

    assert_eq!(
        context.get_bean_definition_names(),
        vec!["database", "userRepository", "ticket", "pool", "port", "broken"]
    );
    assert_eq!(context.get_bean_by_type::<Database>().unwrap().url, "file://data");
}
