use std::sync::Arc;

use proptest::prelude::*;

use rust_gb_isa::{
    Catalog, Descriptor, Engine, FlagEffect, Flags, Instruction, Memory, Ram, Value, encode,
};

const ORIGIN: u16 = 0x0100;

#[derive(Debug, Clone, Copy)]
struct State {
    regs: [u8; 7],
    f: u8,
    sp: u16,
    memory_byte: u8,
}

fn state() -> impl Strategy<Value = State> {
    (any::<[u8; 7]>(), any::<u8>(), 0x8000u16..0xFF00, any::<u8>()).prop_map(
        |(regs, f, sp, memory_byte)| State {
            regs,
            f,
            sp,
            memory_byte,
        },
    )
}

/// 以給定狀態建立引擎，把指令放在 ORIGIN 並執行一步
fn execute_once(catalog: &Arc<Catalog>, desc: &Descriptor, operand: [u8; 2], s: State) -> Engine {
    let values: Vec<Value> = desc
        .immediates()
        .map(|kind| Value::from_bytes(kind, operand[0], operand[1]))
        .collect();
    let instruction = Instruction::new(desc, &values).unwrap();

    let mut memory = Ram::new(0x10000);
    // (HL)、(BC) 等間接存取讀到的值
    for address in [0xC000u16, 0xC001, 0xD000] {
        memory.write_byte(address, s.memory_byte);
    }
    memory.load(ORIGIN as usize, &encode(&instruction));

    let mut engine = Engine::new(catalog.clone(), memory);
    let regs = engine.registers_mut();
    regs.set_a(s.regs[0]);
    regs.set_b(s.regs[1]);
    regs.set_c(s.regs[2]);
    regs.set_d(s.regs[3]);
    regs.set_e(s.regs[4]);
    regs.set_h(s.regs[5]);
    regs.set_l(s.regs[6]);
    regs.set_f(s.f);
    regs.set_sp(s.sp);
    regs.set_pc(ORIGIN);

    engine.step().unwrap();
    engine
}

fn executable(catalog: &Catalog) -> Vec<Descriptor> {
    catalog
        .iter()
        .filter(|desc| !desc.is_illegal() && !desc.is_prefix())
        .copied()
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn declared_flag_effects_hold(s in state(), operand in any::<[u8; 2]>()) {
        let catalog = Arc::new(Catalog::builtin());
        for desc in executable(&catalog) {
            let before = Flags::from_bits_truncate(s.f);
            let engine = execute_once(&catalog, &desc, operand, s);
            let after = engine.registers().flags();
            for (flag, effect) in desc.flags.iter() {
                match effect {
                    FlagEffect::Unaffected => prop_assert_eq!(
                        after.contains(flag),
                        before.contains(flag),
                        "{} changed {:?}",
                        desc,
                        flag
                    ),
                    FlagEffect::Reset => {
                        prop_assert!(!after.contains(flag), "{} left {:?} set", desc, flag)
                    }
                    FlagEffect::Set => {
                        prop_assert!(after.contains(flag), "{} left {:?} clear", desc, flag)
                    }
                    FlagEffect::Computed => {}
                }
            }
        }
    }

    #[test]
    fn execution_is_deterministic(s in state(), operand in any::<[u8; 2]>()) {
        let catalog = Arc::new(Catalog::builtin());
        for desc in executable(&catalog) {
            let first = execute_once(&catalog, &desc, operand, s);
            let second = execute_once(&catalog, &desc, operand, s);
            prop_assert_eq!(first.snapshot(), second.snapshot(), "{}", desc);
            prop_assert_eq!(first.memory(), second.memory(), "{}", desc);
        }
    }

    #[test]
    fn pc_advances_by_length_unless_control_transfer(s in state(), operand in any::<[u8; 2]>()) {
        let catalog = Arc::new(Catalog::builtin());
        for desc in executable(&catalog) {
            if desc.is_control_transfer() || desc.mnemonic == rust_gb_isa::Mnemonic::Halt {
                continue;
            }
            let engine = execute_once(&catalog, &desc, operand, s);
            prop_assert_eq!(
                engine.registers().get_pc(),
                ORIGIN + desc.length as u16,
                "{}",
                desc
            );
        }
    }
}

#[test]
fn test_zero_flag_follows_result() {
    let catalog = Arc::new(Catalog::builtin());
    let sub_a = *catalog.base(0x97).unwrap(); // SUB A
    let s = State {
        regs: [0x42, 0, 0, 0, 0, 0, 0],
        f: 0,
        sp: 0xFFFE,
        memory_byte: 0,
    };
    let engine = execute_once(&catalog, &sub_a, [0, 0], s);
    assert_eq!(engine.registers().get_a(), 0);
    assert!(engine.registers().flag(Flags::Z));
    assert!(engine.registers().flag(Flags::N));
}
