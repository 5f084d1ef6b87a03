use std::collections::HashMap;

use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Ident, Token, parse::Parse, parse::ParseStream};

/// 形如 `key = true, other = false` 的布尔参数集合
#[derive(Default)]
pub(crate) struct AttrFlags {
    values: HashMap<String, bool>,
}

impl AttrFlags {
    /// 解析并校验键名；未知键或重复键均报错
    pub(crate) fn parse_allowed(input: ParseStream, allowed: &[&str]) -> syn::Result<Self> {
        let mut values = HashMap::new();
        if input.is_empty() {
            return Ok(Self { values });
        }

        let pairs: Punctuated<FlagElem, Token![,]> = Punctuated::parse_terminated(input)?;
        for elem in pairs {
            let key = elem.key.to_string();
            if !allowed.contains(&key.as_str()) {
                return Err(syn::Error::new(
                    elem.key.span(),
                    format!("unknown key in attribute; expected one of {allowed:?}"),
                ));
            }
            if values.insert(key.clone(), elem.value).is_some() {
                return Err(syn::Error::new(
                    elem.key.span(),
                    format!("duplicate key '{key}' in attribute"),
                ));
            }
        }
        Ok(Self { values })
    }

    pub(crate) fn get_or(&self, key: &str, default: bool) -> bool {
        self.values.get(key).copied().unwrap_or(default)
    }
}

struct FlagElem {
    key: Ident,
    value: bool,
}

impl Parse for FlagElem {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let key: Ident = input.parse()?;
        let _eq: Token![=] = input.parse()?;
        let expr: syn::Expr = input.parse()?;
        match expr {
            syn::Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Bool(b),
                ..
            }) => Ok(Self {
                key,
                value: b.value(),
            }),
            other => Err(syn::Error::new(
                other.span(),
                format!("expected boolean literal for '{key}'"),
            )),
        }
    }
}
