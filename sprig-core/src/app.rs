use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::config::{split_list, EnvironmentPropertySource, TomlPropertySource};
use crate::configuration::Configuration;
use crate::constants::{DEFAULT_CONFIG_FILE, DEFAULT_ENV_PREFIX, PROFILES_ACTIVE_SUFFIX};
use crate::context::{ApplicationContext, ApplicationContextBuilder};
use crate::error::{ApplicationError, ApplicationResult, ContainerResult};
use crate::logging::LoggingConfig;

type Initializer = Box<dyn Fn(&Arc<ApplicationContext>) -> ApplicationResult<()> + Send + Sync>;
type ConfigurationRegistration = Box<dyn FnOnce(&ApplicationContext) -> ContainerResult<()> + Send>;

/// Sprig 应用程序
///
/// 提供便捷的应用启动方式：
///
/// ```ignore
/// let context = SprigApplication::new("demo")
///     .configuration(AppConfig::default())
///     .run()?;
/// ```
pub struct SprigApplication {
    /// 应用名称
    name: String,

    /// 配置文件路径
    config_files: Vec<String>,

    /// 环境变量前缀
    env_prefix: String,

    /// 激活的 profiles
    profiles: Vec<String>,

    /// 日志配置
    logging_config: Option<LoggingConfig>,

    /// 配置类（按添加顺序注册）
    configurations: Vec<ConfigurationRegistration>,

    /// 自定义初始化函数
    initializers: Vec<Initializer>,
}

impl SprigApplication {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config_files: vec![DEFAULT_CONFIG_FILE.to_string()],
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            profiles: Vec::new(),
            logging_config: None,
            configurations: Vec::new(),
            initializers: Vec::new(),
        }
    }

    /// 设置配置文件路径
    pub fn config_file(mut self, path: impl Into<String>) -> Self {
        self.config_files = vec![path.into()];
        self
    }

    /// 设置多个配置文件（按顺序加载）
    pub fn config_files(mut self, paths: Vec<String>) -> Self {
        self.config_files = paths;
        self
    }

    /// 设置环境变量前缀
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// 设置激活的 profiles
    pub fn profiles(mut self, profiles: Vec<String>) -> Self {
        self.profiles = profiles;
        self
    }

    /// 设置日志配置
    ///
    /// `logging.*` 配置项和 RUST_LOG / LOG_LEVEL / LOG_FORMAT 会覆盖这里的值
    pub fn logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = Some(config);
        self
    }

    /// 添加配置类
    pub fn configuration<C: Configuration>(mut self, config: C) -> Self {
        self.configurations.push(Box::new(move |context: &ApplicationContext| {
            context.register_configuration(config).map(|_| ())
        }));
        self
    }

    /// 添加初始化器，在配置类注册之后、refresh 之前执行
    pub fn initializer<F>(mut self, f: F) -> Self
    where
        F: Fn(&Arc<ApplicationContext>) -> ApplicationResult<()> + Send + Sync + 'static,
    {
        self.initializers.push(Box::new(f));
        self
    }

    /// 运行应用
    pub fn run(self) -> ApplicationResult<Arc<ApplicationContext>> {
        let start_time = Instant::now();

        let active_profiles = self.resolve_profiles();

        let mut builder = ApplicationContext::builder();

        // 加载配置文件（优先级：default -> profile specific -> environment）
        builder = self.load_configurations(builder, &active_profiles)?;
        builder = builder
            .add_property_source(Box::new(EnvironmentPropertySource::new(&self.env_prefix)))
            .set_active_profiles(active_profiles.clone());

        let context = builder.build()?;
        context.set_app_name(self.name.clone());

        self.init_logging(&context);

        tracing::info!("Starting {} application", self.name);
        if active_profiles.is_empty() {
            tracing::info!("No active profiles set, using default configuration");
        } else {
            tracing::info!("Active profiles: {:?}", active_profiles);
        }
        tracing::debug!("Environment variable prefix: {}", self.env_prefix);

        for register in self.configurations {
            register(&context)?;
        }

        for initializer in &self.initializers {
            initializer(&context)?;
        }

        context.refresh()?;

        tracing::info!(
            "Started {} in {}ms",
            self.name,
            start_time.elapsed().as_millis()
        );

        Ok(context)
    }

    /// 解析 active profiles
    ///
    /// 优先级：代码设置 > 环境变量 `<prefix>PROFILES_ACTIVE`
    fn resolve_profiles(&self) -> Vec<String> {
        if !self.profiles.is_empty() {
            return self.profiles.clone();
        }

        let var = format!("{}{}", self.env_prefix, PROFILES_ACTIVE_SUFFIX);
        std::env::var(var)
            .map(|value| split_list(&value))
            .unwrap_or_default()
    }

    fn init_logging(&self, context: &ApplicationContext) {
        let config = self
            .logging_config
            .clone()
            .unwrap_or_default()
            .apply_environment(context.environment())
            .with_env_overrides();

        // 全局订阅者已存在时（例如同一进程内多次启动）沿用已有的订阅者
        if let Err(e) = config.init() {
            tracing::debug!("Logging already initialized: {}", e);
        }
    }

    /// 加载配置文件
    ///
    /// 加载顺序（优先级从低到高）：
    /// 1. application.toml
    /// 2. application-{profile}.toml
    fn load_configurations(
        &self,
        mut builder: ApplicationContextBuilder,
        active_profiles: &[String],
    ) -> ApplicationResult<ApplicationContextBuilder> {
        for base_config in &self.config_files {
            builder = try_load_config_file(builder, base_config, 0);
        }

        for (index, profile) in active_profiles.iter().enumerate() {
            for base_config in &self.config_files {
                let profile_config = profile_config_path(base_config, profile);
                let priority = i32::try_from(index)
                    .map(|i| 10 + i)
                    .map_err(|e| ApplicationError::ConfigLoadFailed(e.to_string()))?;
                builder = try_load_config_file(builder, &profile_config, priority);
            }
        }

        Ok(builder)
    }
}

/// 由基础配置文件推导 profile 配置文件路径
///
/// 例如：application.toml -> application-dev.toml
fn profile_config_path(base_path: &str, profile: &str) -> String {
    let path = Path::new(base_path);
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => path
            .with_file_name(format!(
                "{}-{}.{}",
                stem.to_string_lossy(),
                profile,
                ext.to_string_lossy()
            ))
            .to_string_lossy()
            .into_owned(),
        _ => format!("{}-{}", base_path, profile),
    }
}

/// 文件不存在时跳过，无法解析时记录警告后跳过
fn try_load_config_file(
    builder: ApplicationContextBuilder,
    config_file: &str,
    priority: i32,
) -> ApplicationContextBuilder {
    if !Path::new(config_file).exists() {
        tracing::debug!("Configuration file not found: {}", config_file);
        return builder;
    }

    match TomlPropertySource::from_file(config_file) {
        Ok(source) => {
            tracing::info!("Loaded configuration from: {} (priority: {})", config_file, priority);
            builder.add_property_source(Box::new(source.with_priority(priority)))
        }
        Err(e) => {
            tracing::warn!("Failed to load {}: {}", config_file, e);
            builder
        }
    }
}

impl Default for SprigApplication {
    fn default() -> Self {
        Self::new("SprigApplication")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bean_factory::{BeanFactory, BeanFactoryExt};
    use crate::logging::LogLevel;
    use std::fs;

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("sprig-app-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_profile_config_path() {
        assert_eq!(profile_config_path("application.toml", "dev"), "application-dev.toml");
        assert_eq!(
            profile_config_path("config/application.toml", "prod"),
            "config/application-prod.toml"
        );
        assert_eq!(profile_config_path("settings", "dev"), "settings-dev");
    }

    #[test]
    fn test_run_loads_profile_overrides() {
        let dir = temp_dir("profiles");
        let base = dir.join("application.toml");
        fs::write(&base, "[app]\nname = \"base\"\nmode = \"default\"\n").unwrap();
        fs::write(dir.join("application-dev.toml"), "[app]\nmode = \"dev\"\n").unwrap();

        let context = SprigApplication::new("profile-test")
            .config_file(base.to_string_lossy())
            .env_prefix("SPRIG_APP_PROFILE_TEST_")
            .profiles(vec!["dev".to_string()])
            .logging(LoggingConfig::new().level(LogLevel::Error))
            .run()
            .unwrap();

        let env = context.environment();
        assert_eq!(env.get_string("app.name").as_deref(), Some("base"));
        assert_eq!(env.get_string("app.mode").as_deref(), Some("dev"));
        assert_eq!(env.get_active_profiles(), vec!["dev"]);
        assert_eq!(context.app_name().as_deref(), Some("profile-test"));

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_run_skips_missing_and_invalid_files() {
        let dir = temp_dir("invalid");
        let broken = dir.join("broken.toml");
        fs::write(&broken, "this is = = not toml").unwrap();

        let context = SprigApplication::new("invalid-test")
            .config_files(vec![
                dir.join("missing.toml").to_string_lossy().into_owned(),
                broken.to_string_lossy().into_owned(),
            ])
            .env_prefix("SPRIG_APP_INVALID_TEST_")
            .run()
            .unwrap();

        assert!(context.is_refreshed());
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_profiles_from_environment_variable() {
        std::env::set_var("SPRIG_APP_ENV_PROFILE_TEST_PROFILES_ACTIVE", "qa, local");

        let app = SprigApplication::new("env-profile-test").env_prefix("SPRIG_APP_ENV_PROFILE_TEST_");
        assert_eq!(app.resolve_profiles(), vec!["qa", "local"]);

        let explicit = SprigApplication::new("explicit")
            .env_prefix("SPRIG_APP_ENV_PROFILE_TEST_")
            .profiles(vec!["prod".to_string()]);
        assert_eq!(explicit.resolve_profiles(), vec!["prod"]);

        std::env::remove_var("SPRIG_APP_ENV_PROFILE_TEST_PROFILES_ACTIVE");
    }

    #[test]
    fn test_initializers_run_before_refresh() {
        let context = SprigApplication::new("initializer-test")
            .config_files(Vec::new())
            .env_prefix("SPRIG_APP_INITIALIZER_TEST_")
            .initializer(|context| {
                assert!(!context.is_refreshed());
                context.register_singleton("answer", |_: &dyn BeanFactory| Ok(42u32))?;
                Ok(())
            })
            .run()
            .unwrap();

        let answer = context.get_bean_by_type::<u32>().unwrap();
        assert_eq!(*answer, 42);
        assert_eq!(context.get_bean_definition_names(), vec!["answer"]);
    }
}
