//! Static per-opcode m-cycle costs.
//!
//! [`M_CYCLES`] holds the base (condition-not-taken) cost of every main-page opcode; the
//! executor adds the taken-branch delta on top. The CB page is uniform enough to derive
//! at compile time: every form costs 2 m-cycles, except that (HL) targets pay 4 for the
//! read-modify-write and 3 for the read-only BIT.
//!
//! Entries at the eleven unassigned opcode bytes are never looked up.

/// Base m-cycles per main-page opcode, conditionals counted as not taken.
pub static M_CYCLES: [u8; 256] = [
    // 0x0_
    1, 3, 2, 2, 1, 1, 2, 1, 5, 2, 2, 2, 1, 1, 2, 1,
    // 0x1_
    1, 3, 2, 2, 1, 1, 2, 1, 3, 2, 2, 2, 1, 1, 2, 1,
    // 0x2_
    2, 3, 2, 2, 1, 1, 2, 1, 2, 2, 2, 2, 1, 1, 2, 1,
    // 0x3_
    2, 3, 2, 2, 3, 3, 3, 1, 2, 2, 2, 2, 1, 1, 2, 1,
    // 0x4_
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1,
    // 0x5_
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1,
    // 0x6_
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1,
    // 0x7_
    2, 2, 2, 2, 2, 2, 1, 2, 1, 1, 1, 1, 1, 1, 2, 1,
    // 0x8_
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1,
    // 0x9_
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1,
    // 0xA_
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1,
    // 0xB_
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1,
    // 0xC_
    2, 3, 3, 4, 3, 4, 2, 4, 2, 4, 3, 1, 3, 6, 2, 4,
    // 0xD_
    2, 3, 3, 1, 3, 4, 2, 4, 2, 4, 3, 1, 3, 1, 2, 4,
    // 0xE_
    3, 3, 2, 1, 1, 4, 2, 4, 4, 1, 4, 1, 1, 1, 2, 4,
    // 0xF_
    3, 3, 2, 1, 1, 4, 2, 4, 3, 2, 4, 1, 1, 1, 2, 4,
];

/// Total m-cycles per CB-page opcode, prefix fetch included.
pub static CB_M_CYCLES: [u8; 256] = cb_table();

const fn cb_table() -> [u8; 256] {
    let mut table = [2u8; 256];
    let mut b = 0;
    while b < 256 {
        if b & 0x07 == 6 {
            // (HL) target: BIT (0x46..=0x7E) only reads, everything else writes back.
            table[b] = if b >> 6 == 0b01 { 3 } else { 4 };
        }
        b += 1;
    }
    table
}

#[cfg(test)]
mod tests {
    use super::{CB_M_CYCLES, M_CYCLES};

    #[test]
    fn canonical_spot_checks() {
        assert_eq!(M_CYCLES[0x00], 1); // NOP
        assert_eq!(M_CYCLES[0x01], 3); // LD BC,imm16
        assert_eq!(M_CYCLES[0x08], 5); // LD (imm16),SP
        assert_eq!(M_CYCLES[0x18], 3); // JR (unconditional)
        assert_eq!(M_CYCLES[0x36], 3); // LD (HL),imm8
        assert_eq!(M_CYCLES[0x76], 1); // HALT
        assert_eq!(M_CYCLES[0x80], 1); // ADD A,B
        assert_eq!(M_CYCLES[0x86], 2); // ADD A,(HL)
        assert_eq!(M_CYCLES[0xC3], 4); // JP imm16
        assert_eq!(M_CYCLES[0xC5], 4); // PUSH BC
        assert_eq!(M_CYCLES[0xC9], 4); // RET
        assert_eq!(M_CYCLES[0xCD], 6); // CALL imm16
        assert_eq!(M_CYCLES[0xE8], 4); // ADD SP,imm8
        assert_eq!(M_CYCLES[0xF8], 3); // LD HL,SP+imm8
    }

    #[test]
    fn conditional_bases_are_untaken_counts() {
        for op in [0x20, 0x28, 0x30, 0x38] {
            assert_eq!(M_CYCLES[op], 2, "JR cc base");
        }
        for op in [0xC2, 0xCA, 0xD2, 0xDA] {
            assert_eq!(M_CYCLES[op], 3, "JP cc base");
        }
        for op in [0xC4, 0xCC, 0xD4, 0xDC] {
            assert_eq!(M_CYCLES[op], 3, "CALL cc base");
        }
        for op in [0xC0, 0xC8, 0xD0, 0xD8] {
            assert_eq!(M_CYCLES[op], 2, "RET cc base");
        }
    }

    #[test]
    fn cb_costs_follow_the_ind_hl_rule() {
        for b in 0..=0xFFusize {
            let expected = if b & 0x07 == 6 {
                if (0x40..=0x7F).contains(&b) {
                    3
                } else {
                    4
                }
            } else {
                2
            };
            assert_eq!(CB_M_CYCLES[b], expected, "CB {b:#04X}");
        }
        assert_eq!(CB_M_CYCLES[0x31], 2); // SWAP C
        assert_eq!(CB_M_CYCLES[0x46], 3); // BIT 0,(HL)
        assert_eq!(CB_M_CYCLES[0xC6], 4); // SET 0,(HL)
    }
}
