//! 步骤结果日志
//!
//! 按步骤下标（0 起）定位的有序日志：同一下标重复写入为覆盖，允许乱序写入；遍历永远按下标升序。

use serde::Serialize;

/// 单个步骤的结果文本与失败标签
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub content: String,
    pub failed: bool,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct StepResults {
    slots: Vec<Option<StepRecord>>,
}

impl StepResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录 index 处结果；已存在则覆盖
    pub fn record(&mut self, index: usize, record: StepRecord) {
        if index >= self.slots.len() {
            self.slots.resize(index + 1, None);
        }
        self.slots[index] = Some(record);
    }

    pub fn get(&self, index: usize) -> Option<&StepRecord> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// 已记录的 (下标, 结果)，按下标升序
    pub fn iter(&self) -> impl Iterator<Item = (usize, &StepRecord)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|r| (i, r)))
    }

    /// 已记录的步骤数（不含空位）
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
