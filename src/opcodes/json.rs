// JSON 操作碼描述的讀寫
//
// 格式與常見的 Opcodes.json 相同：
// { "unprefixed": { "0x00": { "mnemonic": "NOP", "bytes": 1, "cycles": [4], ... } },
//   "cbprefixed": { ... } }

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{
    Catalog, Cond, Cycles, Descriptor, FlagEffect, FlagEffects, Mnemonic, Opcode, Operand,
};
use crate::error::CatalogError;
use crate::registers::{Reg8, Reg16};

#[derive(Serialize, Deserialize, Debug, Clone)]
struct OperandEntry {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bytes: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    immediate: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    increment: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    decrement: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct FlagsEntry {
    #[serde(rename = "Z")]
    z: String,
    #[serde(rename = "N")]
    n: String,
    #[serde(rename = "H")]
    h: String,
    #[serde(rename = "C")]
    c: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct OpcodeEntry {
    mnemonic: String,
    bytes: u8,
    cycles: Vec<u8>,
    #[serde(default)]
    operands: Vec<OperandEntry>,
    #[serde(default)]
    immediate: bool,
    flags: FlagsEntry,
}

#[derive(Serialize, Deserialize, Debug, Default)]
struct RawOpcodes {
    #[serde(default)]
    unprefixed: BTreeMap<String, OpcodeEntry>,
    #[serde(default)]
    cbprefixed: BTreeMap<String, OpcodeEntry>,
}

pub(super) fn parse(data: &str) -> Result<Catalog, CatalogError> {
    let raw: RawOpcodes = serde_json::from_str(data)?;

    let mut unprefixed = vec![None; 256];
    let mut cbprefixed = vec![None; 256];

    for (key, entry) in &raw.unprefixed {
        let code = parse_key(key)?;
        unprefixed[code as usize] = Some(descriptor(Opcode::Base(code), entry)?);
    }
    for (key, entry) in &raw.cbprefixed {
        let code = parse_key(key)?;
        cbprefixed[code as usize] = Some(descriptor(Opcode::Extended(code), entry)?);
    }

    Ok(Catalog::from_tables(unprefixed, cbprefixed))
}

pub(super) fn render(catalog: &Catalog) -> Result<String, CatalogError> {
    let mut raw = RawOpcodes::default();
    for desc in catalog.iter() {
        let key = format!("0x{:02X}", desc.opcode.byte());
        let table = if desc.opcode.is_extended() {
            &mut raw.cbprefixed
        } else {
            &mut raw.unprefixed
        };
        table.insert(key, entry(desc));
    }
    Ok(serde_json::to_string_pretty(&raw)?)
}

fn parse_key(key: &str) -> Result<u8, CatalogError> {
    let digits = key.trim_start_matches("0x").trim_start_matches("0X");
    u8::from_str_radix(digits, 16).map_err(|_| CatalogError::BadKey(key.to_string()))
}

fn descriptor(opcode: Opcode, entry: &OpcodeEntry) -> Result<Descriptor, CatalogError> {
    let mnemonic: Mnemonic = entry
        .mnemonic
        .parse()
        .map_err(|_| CatalogError::UnknownMnemonic(entry.mnemonic.clone()))?;

    let operands = operands(opcode, mnemonic, &entry.operands)?;

    let taken = *entry
        .cycles
        .first()
        .ok_or(CatalogError::MissingCycles { opcode })?;
    let not_taken = entry.cycles.get(1).copied().unwrap_or(taken);

    let desc = Descriptor {
        opcode,
        mnemonic,
        operands,
        length: entry.bytes,
        cycles: Cycles::branch(taken, not_taken),
        flags: FlagEffects {
            z: flag_effect(&entry.flags.z)?,
            n: flag_effect(&entry.flags.n)?,
            h: flag_effect(&entry.flags.h)?,
            c: flag_effect(&entry.flags.c)?,
        },
    };

    if desc.expected_length() != desc.length {
        return Err(CatalogError::LengthMismatch {
            opcode,
            declared: desc.length,
            expected: desc.expected_length(),
        });
    }
    Ok(desc)
}

fn flag_effect(s: &str) -> Result<FlagEffect, CatalogError> {
    FlagEffect::parse(s).ok_or_else(|| CatalogError::BadFlag(s.to_string()))
}

fn operands(
    opcode: Opcode,
    mnemonic: Mnemonic,
    entries: &[OperandEntry],
) -> Result<[Option<Operand>; 2], CatalogError> {
    let mut out = Vec::with_capacity(2);
    let mut iter = entries.iter().peekable();
    while let Some(entry) = iter.next() {
        // 部分描述把 SP+e8 拆成 SP (increment) 與 e8 兩個運算元
        if entry.name == "SP" && entry.increment == Some(true) {
            if let Some(next) = iter.peek()
                && matches!(next.name.as_str(), "e8" | "r8" | "s8")
            {
                iter.next();
                out.push(Operand::SpOffset);
                continue;
            }
        }
        out.push(operand(opcode, mnemonic, entry)?);
    }
    if out.len() > 2 {
        return Err(CatalogError::TooManyOperands { opcode });
    }
    Ok([out.first().copied(), out.get(1).copied()])
}

fn operand(
    opcode: Opcode,
    mnemonic: Mnemonic,
    entry: &OperandEntry,
) -> Result<Operand, CatalogError> {
    let name = entry.name.as_str();
    let immediate = entry.immediate.unwrap_or(true);
    let unknown = || CatalogError::UnknownOperand {
        opcode,
        name: entry.name.clone(),
    };

    if mnemonic.is_control_transfer()
        && let Ok(cond) = name.parse::<Cond>()
    {
        return Ok(Operand::Cond(cond));
    }

    let op = match name {
        "n8" | "d8" => Operand::Imm8,
        "n16" | "d16" => Operand::Imm16,
        "a16" if immediate => Operand::Imm16,
        "a16" => Operand::Addr16,
        "a8" => Operand::HighAddr8,
        "e8" | "r8" | "s8" => Operand::Rel8,
        "SP+e8" | "SP+r8" => Operand::SpOffset,
        "HL+" => Operand::HlInc,
        "HL-" => Operand::HlDec,
        "HL" if !immediate && entry.increment == Some(true) => Operand::HlInc,
        "HL" if !immediate && entry.decrement == Some(true) => Operand::HlDec,
        "C" if !immediate => Operand::HighC,
        _ if name.starts_with('$') => {
            let v = u8::from_str_radix(&name[1..], 16).map_err(|_| unknown())?;
            Operand::Vector(v)
        }
        _ => {
            if let Ok(reg) = name.parse::<Reg16>() {
                if immediate {
                    Operand::Reg16(reg)
                } else {
                    Operand::Indirect(reg)
                }
            } else if let Ok(reg) = name.parse::<Reg8>() {
                Operand::Reg8(reg)
            } else if let Ok(n) = name.parse::<u8>() {
                match mnemonic {
                    Mnemonic::Bit | Mnemonic::Res | Mnemonic::Set if n < 8 => Operand::Bit(n),
                    Mnemonic::Bit | Mnemonic::Res | Mnemonic::Set => return Err(unknown()),
                    _ => Operand::Literal(n),
                }
            } else {
                return Err(unknown());
            }
        }
    };
    Ok(op)
}

fn entry(desc: &Descriptor) -> OpcodeEntry {
    let mnemonic = if desc.is_illegal() {
        format!("ILLEGAL_{:02X}", desc.opcode.byte())
    } else {
        desc.mnemonic.name().to_string()
    };
    let cycles = if desc.cycles.is_conditional() {
        vec![desc.cycles.taken, desc.cycles.not_taken]
    } else {
        vec![desc.cycles.taken]
    };
    let operands: Vec<OperandEntry> = desc.operands().map(operand_entry).collect();
    let immediate = operands.iter().all(|op| op.immediate != Some(false));

    let letter = |effect: FlagEffect, name: &str| match effect {
        FlagEffect::Unaffected => "-".to_string(),
        FlagEffect::Reset => "0".to_string(),
        FlagEffect::Set => "1".to_string(),
        FlagEffect::Computed => name.to_string(),
    };

    OpcodeEntry {
        mnemonic,
        bytes: desc.length,
        cycles,
        operands,
        immediate,
        flags: FlagsEntry {
            z: letter(desc.flags.z, "Z"),
            n: letter(desc.flags.n, "N"),
            h: letter(desc.flags.h, "H"),
            c: letter(desc.flags.c, "C"),
        },
    }
}

fn operand_entry(op: Operand) -> OperandEntry {
    let (name, bytes, immediate, increment, decrement) = match op {
        Operand::Reg8(r) => (r.name().to_string(), None, true, None, None),
        Operand::Reg16(r) => (r.name().to_string(), None, true, None, None),
        Operand::Indirect(r) => (r.name().to_string(), None, false, None, None),
        Operand::HlInc => ("HL".to_string(), None, false, Some(true), None),
        Operand::HlDec => ("HL".to_string(), None, false, None, Some(true)),
        Operand::HighC => ("C".to_string(), None, false, None, None),
        Operand::Imm8 => ("n8".to_string(), Some(1), true, None, None),
        Operand::Imm16 => ("n16".to_string(), Some(2), true, None, None),
        Operand::Rel8 => ("e8".to_string(), Some(1), true, None, None),
        Operand::Addr16 => ("a16".to_string(), Some(2), false, None, None),
        Operand::HighAddr8 => ("a8".to_string(), Some(1), false, None, None),
        Operand::SpOffset => ("SP+e8".to_string(), Some(1), true, None, None),
        Operand::Cond(c) => (c.name().to_string(), None, true, None, None),
        Operand::Bit(b) => (b.to_string(), None, true, None, None),
        Operand::Vector(v) => (format!("${:02X}", v), None, true, None, None),
        Operand::Literal(v) => (v.to_string(), None, true, None, None),
    };
    OperandEntry {
        name,
        bytes,
        immediate: Some(immediate),
        increment,
        decrement,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "unprefixed": {
            "0x00": { "mnemonic": "NOP", "bytes": 1, "cycles": [4], "operands": [],
                      "immediate": true, "flags": { "Z": "-", "N": "-", "H": "-", "C": "-" } },
            "0x20": { "mnemonic": "JR", "bytes": 2, "cycles": [12, 8],
                      "operands": [ { "name": "NZ", "immediate": true },
                                    { "name": "e8", "bytes": 1, "immediate": true } ],
                      "immediate": true, "flags": { "Z": "-", "N": "-", "H": "-", "C": "-" } },
            "0xE2": { "mnemonic": "LDH", "bytes": 1, "cycles": [8],
                      "operands": [ { "name": "C", "immediate": false },
                                    { "name": "A", "immediate": true } ],
                      "immediate": false, "flags": { "Z": "-", "N": "-", "H": "-", "C": "-" } },
            "0xF8": { "mnemonic": "LD", "bytes": 2, "cycles": [12],
                      "operands": [ { "name": "HL", "immediate": true },
                                    { "name": "SP", "increment": true, "immediate": true },
                                    { "name": "e8", "bytes": 1, "immediate": true } ],
                      "immediate": true, "flags": { "Z": "0", "N": "0", "H": "H", "C": "C" } }
        },
        "cbprefixed": {
            "0x7E": { "mnemonic": "BIT", "bytes": 2, "cycles": [12],
                      "operands": [ { "name": "7", "immediate": true },
                                    { "name": "HL", "immediate": false } ],
                      "immediate": false, "flags": { "Z": "Z", "N": "0", "H": "1", "C": "-" } }
        }
    }"#;

    #[test]
    fn test_parse_sample_description() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert_eq!(catalog.len(), 5);

        let jr = catalog.base(0x20).unwrap();
        assert_eq!(jr.operands, [Some(Operand::Cond(Cond::NZ)), Some(Operand::Rel8)]);
        assert_eq!(jr.cycles, Cycles::branch(12, 8));

        assert_eq!(catalog.base(0xE2).unwrap().to_string(), "LDH (C) A");
        assert_eq!(catalog.base(0xF8).unwrap().to_string(), "LD HL SP+e8");
        assert_eq!(catalog.base(0xF8).unwrap().flags.to_string(), "00HC");
        assert_eq!(catalog.extended(0x7E).unwrap().to_string(), "BIT 7 (HL)");

        // 描述裡沒有的格子是空洞
        assert!(catalog.base(0x01).is_none());
        assert!(catalog.extended(0x00).is_none());
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let bad = r#"{ "unprefixed": { "0x06": { "mnemonic": "LD", "bytes": 1, "cycles": [8],
            "operands": [ { "name": "B" }, { "name": "n8", "bytes": 1 } ],
            "flags": { "Z": "-", "N": "-", "H": "-", "C": "-" } } } }"#;
        match Catalog::from_json(bad) {
            Err(CatalogError::LengthMismatch {
                declared, expected, ..
            }) => {
                assert_eq!(declared, 1);
                assert_eq!(expected, 2);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_mnemonic_is_rejected() {
        let bad = r#"{ "unprefixed": { "0x00": { "mnemonic": "FOO", "bytes": 1, "cycles": [4],
            "flags": { "Z": "-", "N": "-", "H": "-", "C": "-" } } } }"#;
        assert!(matches!(
            Catalog::from_json(bad),
            Err(CatalogError::UnknownMnemonic(_))
        ));
    }

    #[test]
    fn test_builtin_survives_json_roundtrip() {
        let builtin = Catalog::builtin();
        let text = builtin.to_json().unwrap();
        let reloaded = Catalog::from_json(&text).unwrap();
        assert_eq!(reloaded, builtin);
    }
}
