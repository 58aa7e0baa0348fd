//! Bean 方法属性的解析工具

use syn::{Attribute, LitStr, Meta, Type};

/// 由 `#[configuration]` 处理并在展开后移除的方法属性
pub(crate) const BEAN_METHOD_ATTRIBUTES: &[&str] = &["bean", "scope", "lazy", "init", "destroy"];

/// Bean 方法上的属性配置
pub(crate) struct BeanMethodAttrs {
    pub name: Option<String>,
    pub prototype: bool,
    pub lazy: bool,
    pub init: Option<String>,
    pub destroy: Option<String>,
}

impl BeanMethodAttrs {
    /// 解析方法属性，没有 `#[bean]` 时返回 `Ok(None)`
    pub(crate) fn parse(attrs: &[Attribute]) -> syn::Result<Option<Self>> {
        let Some(bean_attr) = find_attr(attrs, "bean") else {
            return Ok(None);
        };

        let name = optional_str_arg(bean_attr)?.map(|lit| lit.value());

        let prototype = match find_attr(attrs, "scope") {
            Some(attr) => {
                let lit: LitStr = attr.parse_args()?;
                match lit.value().to_lowercase().as_str() {
                    "singleton" => false,
                    "prototype" => true,
                    other => {
                        return Err(syn::Error::new_spanned(
                            lit,
                            format!("unknown scope `{}`, expected \"singleton\" or \"prototype\"", other),
                        ))
                    }
                }
            }
            None => false,
        };

        let lazy = find_attr(attrs, "lazy").is_some();

        let init = callback_name(attrs, "init")?;
        let destroy = callback_name(attrs, "destroy")?;

        Ok(Some(Self {
            name,
            prototype,
            lazy,
            init,
            destroy,
        }))
    }
}

fn find_attr<'a>(attrs: &'a [Attribute], name: &str) -> Option<&'a Attribute> {
    attrs.iter().find(|attr| attr.path().is_ident(name))
}

/// `#[init]` 默认调用 `init`，`#[init("setup")]` 调用 `setup`
fn callback_name(attrs: &[Attribute], name: &str) -> syn::Result<Option<String>> {
    match find_attr(attrs, name) {
        Some(attr) => Ok(Some(
            optional_str_arg(attr)?
                .map(|lit| lit.value())
                .unwrap_or_else(|| name.to_string()),
        )),
        None => Ok(None),
    }
}

/// 解析 `#[attr]` 或 `#[attr("value")]`
pub(crate) fn optional_str_arg(attr: &Attribute) -> syn::Result<Option<LitStr>> {
    match &attr.meta {
        Meta::Path(_) => Ok(None),
        Meta::List(_) => attr.parse_args::<LitStr>().map(Some),
        Meta::NameValue(_) => Err(syn::Error::new_spanned(
            attr,
            "expected `#[attr]` or `#[attr(\"value\")]`",
        )),
    }
}

/// 是否是 Bean 方法的辅助属性
pub(crate) fn is_bean_method_attr(attr: &Attribute) -> bool {
    BEAN_METHOD_ATTRIBUTES
        .iter()
        .any(|name| attr.path().is_ident(name))
}

/// 从 `Result<T, E>` / `ContainerResult<T>` 中提取 T
pub(crate) fn extract_result_type(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Result" && segment.ident != "ContainerResult" {
        return None;
    }
    match &segment.arguments {
        syn::PathArguments::AngleBracketed(args) => match args.args.first() {
            Some(syn::GenericArgument::Type(inner_ty)) => Some(inner_ty),
            _ => None,
        },
        _ => None,
    }
}
