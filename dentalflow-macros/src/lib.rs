//! DentalFlow 过程宏
//!
//! - `#[value_object]`：为值对象补齐派生（Debug/Default/Clone/Serialize/Deserialize/PartialEq/Eq）
//! - `#[entity_id]`：为单字段 tuple struct 形式的标识类型（如 `WorkOrderId(String)`）
//!   补齐派生与常用转换
//!
use proc_macro::TokenStream;

mod attr_flags;
mod derive_utils;
mod entity_id;
mod value_object;

/// 值对象宏
///
/// 参数：`#[value_object(debug = true|false, default = true|false)]`，均默认 `true`。
#[proc_macro_attribute]
pub fn value_object(attr: TokenStream, item: TokenStream) -> TokenStream {
    value_object::expand(attr, item)
}

/// 实体 ID 宏
///
/// 参数：`#[entity_id(debug = true|false)]`，默认 `true`；
/// 为 `false` 时不派生 Debug，便于自定义（例如脱敏输出）。
#[proc_macro_attribute]
pub fn entity_id(attr: TokenStream, item: TokenStream) -> TokenStream {
    entity_id::expand(attr, item)
}
