//! 折叠（reduce）单条记录到归并表
//!
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::work_order::WorkOrderRecord;

use super::aggregated::AggregatedWorkOrder;
use super::key::GroupingKey;

/// 归并表：按键有序
pub type AggregateMap = BTreeMap<GroupingKey, AggregatedWorkOrder>;

/// 将一条记录折叠进归并表
///
/// - 键不存在：以该记录为种子新建归并结果；
/// - 键已存在：追加 id、累加总价，并逐条合并明细（同签名累加数量与价格，否则追加）。
///
/// 最终内容与折叠顺序无关（明细的排列顺序除外）。
pub fn fold_record(map: &mut AggregateMap, key: GroupingKey, record: &WorkOrderRecord) {
    match map.entry(key) {
        Entry::Vacant(slot) => {
            slot.insert(AggregatedWorkOrder::seed(record));
        }
        Entry::Occupied(mut slot) => slot.get_mut().absorb(record),
    }
}
