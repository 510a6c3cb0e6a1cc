//! 執行引擎：取指、解碼、執行迴圈
//!
//! 狀態只有 Running 與 Halted 兩種。PC 走到記憶體長度以外而沒有遇到
//! HALT 時回傳 [`ExecError::MemoryOverrun`]，不會默默停止。

use std::sync::Arc;

use log::{debug, info, trace};
use serde::Serialize;

use crate::config::EngineConfig;
use crate::decoder::{Decoder, MemorySource};
use crate::error::{DecodeError, ExecError};
use crate::instruction::Instruction;
use crate::instructions;
use crate::mmu::{Memory, Ram};
use crate::opcodes::Catalog;
use crate::registers::Registers;
use crate::snapshot::Snapshot;

/// CPU 運行狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CpuState {
    Running, // 正常運行
    Halted,  // 暫停 (HALT)
}

/// 中斷主啟用狀態 (IME)
///
/// 只記錄狀態，不做中斷分派。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InterruptMasterState {
    Disabled, // 已禁用
    Pending,  // 準備啟用 (EI 指令後的延遲週期)
    Enabled,  // 已啟用
}

/// 指令處理器看得到的 CPU 狀態
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cpu {
    pub registers: Registers,
    pub state: CpuState,
    pub ime: InterruptMasterState,
    pub branch_taken: bool, // 條件分支是否成立 (用於正確計算週期)
}

impl Default for Cpu {
    fn default() -> Self {
        Cpu::new()
    }
}

impl Cpu {
    pub fn new() -> Self {
        let mut registers = Registers::new();
        registers.set_sp(0xFFFE);
        Cpu {
            registers,
            state: CpuState::Running,
            ime: InterruptMasterState::Disabled,
            branch_taken: false,
        }
    }

    // 堆疊操作：推入先減 2，彈出後加 2
    pub fn push_word(&mut self, memory: &mut dyn Memory, value: u16) {
        let sp = self.registers.get_sp().wrapping_sub(2);
        self.registers.set_sp(sp);
        memory.write_word(sp, value);
    }

    pub fn pop_word(&mut self, memory: &dyn Memory) -> u16 {
        let sp = self.registers.get_sp();
        let value = memory.read_word(sp);
        self.registers.set_sp(sp.wrapping_add(2));
        value
    }

    /// 緊接在目前指令之後的位址
    pub fn next_pc(&self, instruction: &Instruction) -> u16 {
        self.registers
            .get_pc()
            .wrapping_add(instruction.length() as u16)
    }

    /// 控制轉移：設定 PC 並記錄分支成立
    pub fn jump(&mut self, address: u16) {
        self.registers.set_pc(address);
        self.branch_taken = true;
    }
}

/// 單步執行的結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// 執行了一條指令
    Executed {
        pc: u16,
        instruction: Instruction,
        cycles: u8,
    },
    /// 引擎已經停在 HALT，沒有執行任何東西
    Halted,
}

/// 執行到 HALT 後的統計
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub pc: u16,
    pub instructions: u64,
    pub cycles: u64,
}

#[derive(Debug)]
pub struct Engine<M: Memory = Ram> {
    catalog: Arc<Catalog>,
    cpu: Cpu,
    memory: M,
    config: EngineConfig,
    cycles: u64,
    instructions: u64,
}

impl Engine<Ram> {
    /// 以程式位元組建立引擎
    ///
    /// 未指定 `memory_size` 時，記憶體長度恰好容納載入後的程式。
    pub fn from_program(catalog: Arc<Catalog>, program: &[u8], config: EngineConfig) -> Self {
        let load_address = config.load_address as usize;
        let size = config
            .memory_size
            .unwrap_or(load_address + program.len());
        let mut memory = Ram::new(size);
        memory.load(load_address, program);
        Engine::with_config(catalog, memory, config)
    }
}

impl<M: Memory> Engine<M> {
    pub fn new(catalog: Arc<Catalog>, memory: M) -> Self {
        Engine::with_config(catalog, memory, EngineConfig::default())
    }

    pub fn with_config(catalog: Arc<Catalog>, memory: M, config: EngineConfig) -> Self {
        let mut cpu = Cpu::new();
        cpu.registers.set_sp(config.initial_sp);
        cpu.registers.set_pc(config.start_pc);
        Engine {
            catalog,
            cpu,
            memory,
            config,
            cycles: 0,
            instructions: 0,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn registers(&self) -> &Registers {
        &self.cpu.registers
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.cpu.registers
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> CpuState {
        self.cpu.state
    }

    pub fn is_halted(&self) -> bool {
        self.cpu.state == CpuState::Halted
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn instructions(&self) -> u64 {
        self.instructions
    }

    pub fn into_memory(self) -> M {
        self.memory
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.cpu, self.cycles, self.instructions)
    }

    /// 執行一條指令
    ///
    /// 解碼失敗或遇到未定義的操作碼時不會改動任何狀態。
    /// 最上端位址的指令會執行，但隨後因 PC 超出位址空間而回傳
    /// [`ExecError::MemoryOverrun`]，PC 停在該指令上。
    pub fn step(&mut self) -> Result<StepOutcome, ExecError> {
        if self.cpu.state == CpuState::Halted {
            return Ok(StepOutcome::Halted);
        }

        let pc = self.cpu.registers.get_pc();
        let len = self.memory.len();
        if pc as usize >= len {
            return Err(ExecError::MemoryOverrun {
                pc: pc as usize,
                len,
            });
        }

        let (instruction, consumed) =
            Decoder::new(&self.catalog).decode(&MemorySource(&self.memory), pc as usize)?;
        let descriptor = *instruction.descriptor();
        // 未定義的基本操作碼視同無法辨識
        if descriptor.is_illegal() {
            return Err(DecodeError::UnrecognizedOpcode {
                opcode: descriptor.opcode,
                position: pc as usize,
            }
            .into());
        }

        if self.config.trace {
            info!("{:04X}: {}", pc, instruction);
        } else {
            trace!("{:04X}: {}", pc, instruction);
        }

        // EI 延遲一條指令才生效
        if self.cpu.ime == InterruptMasterState::Pending {
            self.cpu.ime = InterruptMasterState::Enabled;
        }

        self.cpu.branch_taken = false;
        instructions::execute(&mut self.cpu, &mut self.memory, &instruction);

        if self.cpu.state == CpuState::Halted {
            debug!(
                "halted at {:04X} after {} instructions",
                pc,
                self.instructions + 1
            );
        } else if !descriptor.is_control_transfer() {
            let next = self.cpu.next_pc(&instruction);
            self.cpu.registers.set_pc(next);
        }

        let cycles = descriptor.cycles.for_branch(self.cpu.branch_taken);
        self.cycles += cycles as u64;
        self.instructions += 1;

        // 位址空間最上端的指令執行完後，下一個位址已不在 16 位元範圍內
        let next = pc as usize + consumed;
        let falls_through = self.cpu.state == CpuState::Running
            && !(descriptor.is_control_transfer() && self.cpu.branch_taken);
        if falls_through && next > u16::MAX as usize {
            self.cpu.registers.set_pc(pc);
            return Err(ExecError::MemoryOverrun { pc: next, len });
        }

        Ok(StepOutcome::Executed {
            pc,
            instruction,
            cycles,
        })
    }

    /// 反覆執行直到 HALT 或錯誤
    pub fn run(&mut self) -> Result<RunSummary, ExecError> {
        let mut steps = 0u64;
        while self.cpu.state != CpuState::Halted {
            if let Some(max) = self.config.max_steps
                && steps >= max
            {
                return Err(ExecError::StepLimit { steps });
            }
            self.step()?;
            steps += 1;
        }
        Ok(RunSummary {
            pc: self.cpu.registers.get_pc(),
            instructions: self.instructions,
            cycles: self.cycles,
        })
    }
}
