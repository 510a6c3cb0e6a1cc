//! 控制指令的處理模組
//!
//! 包含 NOP, STOP, HALT, DI, EI 等控制指令

use crate::cpu::{Cpu, CpuState, InterruptMasterState};

/// 處理 NOP 指令
pub fn handle_nop(_cpu: &mut Cpu) {
    // 無操作
}

/// 處理 STOP 指令
///
/// 沒有周邊硬體可以喚醒，當作 NOP。
pub fn handle_stop(_cpu: &mut Cpu) {}

/// 處理 HALT 指令；PC 留在 HALT 上
pub fn handle_halt(cpu: &mut Cpu) {
    cpu.state = CpuState::Halted;
}

/// 處理 DI 指令 (停用中斷)
pub fn handle_di(cpu: &mut Cpu) {
    cpu.ime = InterruptMasterState::Disabled;
}

/// 處理 EI 指令 (啟用中斷)
pub fn handle_ei(cpu: &mut Cpu) {
    // EI 不會立即生效，而是在下一個指令之後啟用 IME
    cpu.ime = InterruptMasterState::Pending;
}
