mod attribute_helpers;
mod configuration_attr;

use proc_macro::TokenStream;

/// Configuration impl 块属性宏
///
/// 把 impl 块中所有 `#[bean]` 方法注册为 Bean 定义（按声明顺序），
/// 并为该类型生成 `sprig_core::Configuration` 的实现。
///
/// 方法上可用的属性（展开后会被移除）：
///
/// - `#[bean]` / `#[bean("name")]`：Bean 名称，默认使用方法名
/// - `#[scope("singleton")]` / `#[scope("prototype")]`：作用域，默认单例
/// - `#[lazy]`：延迟初始化，不参与 refresh 时的预实例化
/// - `#[init]` / `#[init("method")]`：初始化回调，默认调用 `init`
/// - `#[destroy]` / `#[destroy("method")]`：销毁回调，默认调用 `destroy`
///
/// Bean 方法接收 `&self`，可以再接收一个 `&dyn BeanFactory` 参数用于查找其他 Bean；
/// 返回 `T` 或 `Result<T, E>`（`E: Into<ContainerError>`）。
///
/// # 用法
///
/// ```ignore
/// use sprig_core::prelude::*;
/// use sprig_core_macros::configuration;
///
/// pub struct AppConfig;
///
/// #[configuration]
/// impl AppConfig {
///     #[bean]
///     pub fn database(&self) -> Database {
///         Database::new()
///     }
///
///     /// 通过容器获取 database，拿到的是同一个单例
///     #[bean("userRepository")]
///     #[init("connect")]
///     pub fn repository(&self, beans: &dyn BeanFactory) -> ContainerResult<Repository> {
///         Ok(Repository::new(beans.get_bean_by_type::<Database>()?))
///     }
///
///     #[bean]
///     #[scope("prototype")]
///     pub fn request_id(&self) -> RequestId {
///         RequestId::next()
///     }
/// }
/// ```
///
/// `#[configuration("name")]` 可以指定配置类实例在容器中的名称，
/// 默认是类型名的 camelCase 形式。
#[proc_macro_attribute]
pub fn configuration(attr: TokenStream, item: TokenStream) -> TokenStream {
    configuration_attr::configuration_impl(attr, item)
}
