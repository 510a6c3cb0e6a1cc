//! 引擎設定
//!
//! 以 JSON 檔案提供，缺少的欄位使用預設值。

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 記憶體長度；未指定時恰好容納載入後的程式
    pub memory_size: Option<usize>,
    /// 程式載入位址
    pub load_address: u16,
    /// 起始 PC
    pub start_pc: u16,
    /// 起始 SP
    pub initial_sp: u16,
    /// 最多執行的指令數，`None` 表示不限
    pub max_steps: Option<u64>,
    /// 以 info 等級記錄每條指令
    pub trace: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            memory_size: None,
            load_address: 0,
            start_pc: 0,
            initial_sp: 0xFFFE,
            max_steps: None,
            trace: false,
        }
    }
}

impl EngineConfig {
    pub fn from_json(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        EngineConfig::from_json(&data)
    }
}
