//! Configuration impl block attribute macro
//!
//! 用于配置类的 impl 块，把所有 #[bean] 方法注册为 Bean 定义

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, FnArg, ImplItem, ImplItemFn, ItemImpl, LitStr, ReturnType};

use crate::attribute_helpers::{extract_result_type, is_bean_method_attr, BeanMethodAttrs};

/// Configuration impl 块属性宏
pub(crate) fn configuration_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let config_name = if attr.is_empty() {
        None
    } else {
        Some(parse_macro_input!(attr as LitStr))
    };
    let mut input = parse_macro_input!(item as ItemImpl);

    match expand(config_name, &mut input) {
        Ok(expanded) => expanded.into(),
        Err(err) => {
            strip_bean_attributes(&mut input);
            let error = err.to_compile_error();
            quote! {
                #input
                #error
            }
            .into()
        }
    }
}

fn expand(config_name: Option<LitStr>, input: &mut ItemImpl) -> syn::Result<TokenStream2> {
    if let Some((_, path, _)) = &input.trait_ {
        return Err(syn::Error::new_spanned(
            path,
            "#[configuration] must be placed on an inherent impl block",
        ));
    }

    // 按声明顺序收集 Bean 方法
    let mut registrations = Vec::new();
    for item in &input.items {
        if let ImplItem::Fn(method) = item {
            if let Some(attrs) = BeanMethodAttrs::parse(&method.attrs)? {
                registrations.push(bean_registration(method, &attrs)?);
            }
        }
    }

    strip_bean_attributes(input);

    let self_ty = &input.self_ty;
    let (impl_generics, _, where_clause) = input.generics.split_for_impl();

    let name_override = config_name.map(|name| {
        quote! {
            fn configuration_name() -> ::std::string::String {
                ::std::string::String::from(#name)
            }
        }
    });

    // 没有 Bean 方法时避免未使用参数的警告
    let unused = registrations
        .is_empty()
        .then(|| quote! { let _ = (config, registry); });

    Ok(quote! {
        #input

        impl #impl_generics ::sprig_core::Configuration for #self_ty #where_clause {
            #name_override

            fn register_bean_methods(
                config: &::std::sync::Arc<Self>,
                registry: &dyn ::sprig_core::BeanDefinitionRegistry,
            ) -> ::sprig_core::ContainerResult<()> {
                #unused
                #(#registrations)*
                ::std::result::Result::Ok(())
            }
        }
    })
}

/// 为单个 Bean 方法生成注册代码
fn bean_registration(method: &ImplItemFn, attrs: &BeanMethodAttrs) -> syn::Result<TokenStream2> {
    let method_name = &method.sig.ident;
    let bean_name = attrs
        .name
        .clone()
        .unwrap_or_else(|| method_name.to_string());

    let mut inputs = method.sig.inputs.iter();
    match inputs.next() {
        Some(FnArg::Receiver(receiver)) if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => {
            return Err(syn::Error::new_spanned(
                &method.sig,
                "#[bean] method must take `&self` as its first parameter",
            ))
        }
    }
    let takes_factory = match (inputs.next(), inputs.next()) {
        (None, _) => false,
        (Some(FnArg::Typed(_)), None) => true,
        _ => {
            return Err(syn::Error::new_spanned(
                &method.sig.inputs,
                "#[bean] method may only take `&self` and an optional `&dyn BeanFactory`",
            ))
        }
    };

    let (return_type, is_result) = match &method.sig.output {
        ReturnType::Default => {
            return Err(syn::Error::new_spanned(
                &method.sig,
                "#[bean] method must return a value",
            ));
        }
        ReturnType::Type(_, ty) => match extract_result_type(ty) {
            Some(inner) => (inner, true),
            None => (ty.as_ref(), false),
        },
    };

    let beans = if takes_factory {
        format_ident!("beans")
    } else {
        format_ident!("_beans")
    };
    let call_args = takes_factory.then(|| quote! { #beans });
    let bean_creation = if is_result {
        quote! { ::std::result::Result::Ok(config.#method_name(#call_args)?) }
    } else {
        quote! { ::std::result::Result::Ok(config.#method_name(#call_args)) }
    };

    let scope = if attrs.prototype {
        quote! { ::sprig_core::Scope::Prototype }
    } else {
        quote! { ::sprig_core::Scope::Singleton }
    };
    let lazy = attrs.lazy;

    let init_callback = attrs.init.as_deref().map(|name| {
        let callback = lifecycle_callback(return_type, name);
        quote! { let definition = definition.with_init(#callback); }
    });
    let destroy_callback = attrs.destroy.as_deref().map(|name| {
        let callback = lifecycle_callback(return_type, name);
        quote! { let definition = definition.with_destroy(#callback); }
    });

    Ok(quote! {
        {
            let config = ::std::sync::Arc::clone(config);
            let definition = ::sprig_core::BeanDefinition::new(
                #bean_name,
                ::sprig_core::FunctionFactory::new(
                    move |#beans: &dyn ::sprig_core::BeanFactory| -> ::sprig_core::ContainerResult<#return_type> {
                        #bean_creation
                    },
                ),
            )
            .with_scope(#scope)
            .with_lazy(#lazy);

            #init_callback
            #destroy_callback

            registry.register_bean_definition(definition)?;
        }
    })
}

/// 生成 init/destroy 回调：把实例向下转型后调用指定方法
fn lifecycle_callback(bean_type: &syn::Type, method: &str) -> TokenStream2 {
    let method = format_ident!("{}", method);
    quote! {
        |bean: &mut (dyn ::std::any::Any + ::std::marker::Send + ::std::marker::Sync)| -> ::sprig_core::ContainerResult<()> {
            match bean.downcast_mut::<#bean_type>() {
                ::std::option::Option::Some(instance) => {
                    ::sprig_core::IntoResult::into_result(instance.#method())
                }
                ::std::option::Option::None => ::std::result::Result::Ok(()),
            }
        }
    }
}

/// 移除方法上的辅助属性，它们不是真正的属性宏
fn strip_bean_attributes(input: &mut ItemImpl) {
    for item in &mut input.items {
        if let ImplItem::Fn(method) = item {
            method.attrs.retain(|attr| !is_bean_method_attr(attr));
        }
    }
}
