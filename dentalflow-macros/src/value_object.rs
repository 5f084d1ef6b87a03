use crate::attr_flags::AttrFlags;
use crate::derive_utils::apply_derives;
use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Item, parse::Parse, parse::ParseStream, parse_macro_input};

/// #[value_object] 宏实现
/// - 支持结构体（具名或 tuple）与枚举
/// - 合并/追加派生：Default, Clone, (Debug 可控), Serialize, Deserialize, PartialEq, Eq
/// - 参数：`debug`、`default`，默认均为 true；
///   枚举需要 `#[default]` 标注默认变体，否则请使用 `default = false`
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let ValueObjectAttrConfig(flags) = parse_macro_input!(attr as ValueObjectAttrConfig);
    let mut input = parse_macro_input!(item as Item);

    let mut required: Vec<syn::Path> = vec![
        syn::parse_quote!(Clone),
        syn::parse_quote!(serde::Serialize),
        syn::parse_quote!(serde::Deserialize),
        syn::parse_quote!(PartialEq),
        syn::parse_quote!(Eq),
    ];
    if flags.get_or("default", true) {
        required.insert(0, syn::parse_quote!(Default));
    }
    if flags.get_or("debug", true) {
        required.insert(0, syn::parse_quote!(Debug));
    }

    match &mut input {
        Item::Struct(st) => {
            apply_derives(&mut st.attrs, required);
            TokenStream::from(quote! { #st })
        }
        Item::Enum(en) => {
            apply_derives(&mut en.attrs, required);
            TokenStream::from(quote! { #en })
        }
        other => syn::Error::new(other.span(), "#[value_object] only supports struct or enum")
            .to_compile_error()
            .into(),
    }
}

// -------- parsing --------

struct ValueObjectAttrConfig(AttrFlags);

impl Parse for ValueObjectAttrConfig {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        AttrFlags::parse_allowed(input, &["debug", "default"]).map(Self)
    }
}
