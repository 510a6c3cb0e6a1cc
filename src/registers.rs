//! 暫存器與旗標模型
//!
//! 八個 8 位元暫存器 (A, F, B, C, D, E, H, L)，其中 BC/DE/HL/AF 可組成 16 位元暫存器對，
//! 另有 16 位元的 SP 與 PC。旗標一律以名稱 ([`Flags::Z`] 等) 存取。

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct Flags: u8 {
        const Z = 0x80; // Zero
        const N = 0x40; // Subtract
        const H = 0x20; // Half-carry
        const C = 0x10; // Carry
    }
}

/// 8 位元暫存器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg8 {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
}

impl Reg8 {
    /// 依指令編碼中的 3 位元欄位取得暫存器 (0:B 1:C 2:D 3:E 4:H 5:L 7:A)
    ///
    /// 6 代表 (HL)，不是暫存器，回傳 `None`。
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits & 0x07 {
            0 => Some(Reg8::B),
            1 => Some(Reg8::C),
            2 => Some(Reg8::D),
            3 => Some(Reg8::E),
            4 => Some(Reg8::H),
            5 => Some(Reg8::L),
            7 => Some(Reg8::A),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Reg8::A => "A",
            Reg8::B => "B",
            Reg8::C => "C",
            Reg8::D => "D",
            Reg8::E => "E",
            Reg8::H => "H",
            Reg8::L => "L",
        }
    }
}

impl fmt::Display for Reg8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Reg8 {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Reg8::A),
            "B" => Ok(Reg8::B),
            "C" => Ok(Reg8::C),
            "D" => Ok(Reg8::D),
            "E" => Ok(Reg8::E),
            "H" => Ok(Reg8::H),
            "L" => Ok(Reg8::L),
            _ => Err(()),
        }
    }
}

/// 16 位元暫存器 (暫存器對與 SP)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg16 {
    AF,
    BC,
    DE,
    HL,
    SP,
}

impl Reg16 {
    pub fn name(self) -> &'static str {
        match self {
            Reg16::AF => "AF",
            Reg16::BC => "BC",
            Reg16::DE => "DE",
            Reg16::HL => "HL",
            Reg16::SP => "SP",
        }
    }
}

impl fmt::Display for Reg16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Reg16 {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AF" => Ok(Reg16::AF),
            "BC" => Ok(Reg16::BC),
            "DE" => Ok(Reg16::DE),
            "HL" => Ok(Reg16::HL),
            "SP" => Ok(Reg16::SP),
            _ => Err(()),
        }
    }
}

macro_rules! get_set {
    ($reg:ident, $get_name:ident, $set_name:ident, $size:ty) => {
        pub fn $get_name(&self) -> $size {
            self.$reg
        }

        pub fn $set_name(&mut self, val: $size) {
            self.$reg = val;
        }
    };
}

macro_rules! get_set_dual {
    ($reg1:ident, $reg2:ident, $get_name:ident, $set_name:ident) => {
        pub fn $get_name(&self) -> u16 {
            (self.$reg1 as u16) << 8 | self.$reg2 as u16
        }

        pub fn $set_name(&mut self, val: u16) {
            self.$reg1 = (val >> 8) as u8;
            self.$reg2 = (val & 0xFF) as u8;
        }
    };
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registers {
    a: u8,
    b: u8,
    c: u8,
    d: u8,
    e: u8,
    f: Flags,
    h: u8,
    l: u8,
    sp: u16,
    pc: u16,
}

impl Registers {
    pub fn new() -> Registers {
        Registers::default()
    }

    get_set!(a, get_a, set_a, u8);
    get_set!(b, get_b, set_b, u8);
    get_set!(c, get_c, set_c, u8);
    get_set!(d, get_d, set_d, u8);
    get_set!(e, get_e, set_e, u8);
    get_set!(h, get_h, set_h, u8);
    get_set!(l, get_l, set_l, u8);
    get_set!(sp, get_sp, set_sp, u16);
    get_set!(pc, get_pc, set_pc, u16);
    get_set_dual!(b, c, get_bc, set_bc);
    get_set_dual!(d, e, get_de, set_de);
    get_set_dual!(h, l, get_hl, set_hl);

    /// F 暫存器的原始值，低四位元永遠為 0
    pub fn get_f(&self) -> u8 {
        self.f.bits()
    }

    pub fn set_f(&mut self, val: u8) {
        self.f = Flags::from_bits_truncate(val & 0xF0);
    }

    pub fn get_af(&self) -> u16 {
        (self.a as u16) << 8 | self.f.bits() as u16
    }

    pub fn set_af(&mut self, val: u16) {
        self.a = (val >> 8) as u8;
        self.f = Flags::from_bits_truncate((val & 0x00F0) as u8);
    }

    pub fn get(&self, reg: Reg8) -> u8 {
        match reg {
            Reg8::A => self.a,
            Reg8::B => self.b,
            Reg8::C => self.c,
            Reg8::D => self.d,
            Reg8::E => self.e,
            Reg8::H => self.h,
            Reg8::L => self.l,
        }
    }

    pub fn set(&mut self, reg: Reg8, val: u8) {
        match reg {
            Reg8::A => self.a = val,
            Reg8::B => self.b = val,
            Reg8::C => self.c = val,
            Reg8::D => self.d = val,
            Reg8::E => self.e = val,
            Reg8::H => self.h = val,
            Reg8::L => self.l = val,
        }
    }

    pub fn get16(&self, reg: Reg16) -> u16 {
        match reg {
            Reg16::AF => self.get_af(),
            Reg16::BC => self.get_bc(),
            Reg16::DE => self.get_de(),
            Reg16::HL => self.get_hl(),
            Reg16::SP => self.sp,
        }
    }

    pub fn set16(&mut self, reg: Reg16, val: u16) {
        match reg {
            Reg16::AF => self.set_af(val),
            Reg16::BC => self.set_bc(val),
            Reg16::DE => self.set_de(val),
            Reg16::HL => self.set_hl(val),
            Reg16::SP => self.sp = val,
        }
    }

    pub fn flags(&self) -> Flags {
        self.f
    }

    pub fn set_flags(&mut self, flags: Flags) {
        self.f = flags;
    }

    /// 以位元測試查詢旗標
    pub fn flag(&self, flag: Flags) -> bool {
        self.f.contains(flag)
    }

    pub fn set_flag(&mut self, flag: Flags, on: bool) {
        self.f.set(flag, on);
    }

    pub fn clear_flag(&mut self, flag: Flags) {
        self.f.remove(flag);
    }

    /// 一次設定四個旗標 (Z, N, H, C)
    pub fn update_flags(&mut self, z: bool, n: bool, h: bool, c: bool) {
        self.f.set(Flags::Z, z);
        self.f.set(Flags::N, n);
        self.f.set(Flags::H, h);
        self.f.set(Flags::C, c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairs_combine_high_low() {
        let mut regs = Registers::new();
        regs.set_b(0x12);
        regs.set_c(0x34);
        assert_eq!(regs.get_bc(), 0x1234);

        regs.set_hl(0xBEEF);
        assert_eq!(regs.get_h(), 0xBE);
        assert_eq!(regs.get_l(), 0xEF);
        assert_eq!(regs.get16(Reg16::HL), 0xBEEF);

        regs.set16(Reg16::DE, 0x0102);
        assert_eq!(regs.get(Reg8::D), 0x01);
        assert_eq!(regs.get(Reg8::E), 0x02);
    }

    #[test]
    fn test_af_masks_low_nibble() {
        let mut regs = Registers::new();
        regs.set_af(0x12FF);
        assert_eq!(regs.get_a(), 0x12);
        assert_eq!(regs.get_f(), 0xF0);
        assert_eq!(regs.get_af(), 0x12F0);
        assert!(regs.flag(Flags::Z));
        assert!(regs.flag(Flags::C));
    }

    #[test]
    fn test_flags_by_name() {
        let mut regs = Registers::new();
        regs.set_flag(Flags::H, true);
        assert!(regs.flag(Flags::H));
        assert!(!regs.flag(Flags::Z));
        assert_eq!(regs.get_f(), 0x20);

        regs.update_flags(true, false, false, true);
        assert_eq!(regs.get_f(), 0x90);
        regs.clear_flag(Flags::Z);
        assert_eq!(regs.get_f(), 0x10);
    }

    #[test]
    fn test_reg8_from_bits() {
        assert_eq!(Reg8::from_bits(0), Some(Reg8::B));
        assert_eq!(Reg8::from_bits(6), None);
        assert_eq!(Reg8::from_bits(7), Some(Reg8::A));
        assert_eq!("HL".parse::<Reg16>(), Ok(Reg16::HL));
    }
}
