//! On-die ECC status decoding
//!
//! Every family reports the result of the last page read in the status
//! register; some need a second register to tell a normal correction from
//! one at the limit of the engine. [`classify`] is the pure decoding step,
//! [`check_ecc`] fetches the second register only when the primary field
//! leaves the result open.

use crate::chip::EccVariant;
use crate::error::Result;
use crate::programmer::{ExecContext, SpiMaster};
use crate::protocol::snand;
use crate::protocol::status::{field, StatusReg};
use crate::spi::opcodes;

/// Outcome of a page read, in increasing order of severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum EccStatus {
    /// No bitflips, or corrected well within the engine's strength
    #[default]
    Good,
    /// Corrected, but close to the correction limit
    Limit,
    /// Uncorrectable: the data is corrupt
    Error,
}

impl EccStatus {
    /// The more severe of two results
    pub fn worst(self, other: Self) -> Self {
        core::cmp::max(self, other)
    }
}

/// Two-bit status code shared by most families
const ECC_UNCORRECTABLE: u8 = 0b10;

/// Decode the ECC result of a read
///
/// `status` is the status register after the read completed. `aux` is the
/// second register for the families that use one (extended status for
/// [`EccVariant::StatusExtended`], the bitflip count for
/// [`EccVariant::AuxRegister`]) and is ignored otherwise.
pub fn classify(variant: EccVariant, status: u8, aux: u8) -> EccStatus {
    match variant {
        EccVariant::Status2Bit { shift } => match field(status, shift, 2) {
            0b00 | 0b01 => EccStatus::Good,
            0b11 => EccStatus::Limit,
            _ => EccStatus::Error,
        },
        EccVariant::Status3Bit { shift } => match field(status, shift, 3) {
            0b000 | 0b001 | 0b011 => EccStatus::Good,
            0b101 => EccStatus::Limit,
            // 010 is uncorrectable, the rest is reserved
            _ => EccStatus::Error,
        },
        EccVariant::StatusExtended { shift, ext_shift } => {
            let code = (field(status, shift, 2) << 2) | field(aux, ext_shift, 2);
            match code >> 2 {
                0b00 => EccStatus::Good,
                ECC_UNCORRECTABLE => EccStatus::Error,
                0b01 if code & 0b11 == 0b11 => EccStatus::Limit,
                0b01 => EccStatus::Good,
                _ => EccStatus::Limit,
            }
        }
        EccVariant::AuxRegister { shift, limit } => match field(status, shift, 2) {
            0b00 => EccStatus::Good,
            ECC_UNCORRECTABLE => EccStatus::Error,
            _ if field(aux, 0, 4) >= limit => EccStatus::Limit,
            _ => EccStatus::Good,
        },
    }
}

/// Evaluate the ECC result of the last page read
///
/// Issues the second register read only when `variant` needs it to decide.
pub fn check_ecc<M: SpiMaster + ?Sized>(
    master: &mut M,
    ctx: ExecContext,
    variant: EccVariant,
    status: StatusReg,
) -> Result<EccStatus> {
    let aux = match variant {
        EccVariant::StatusExtended { shift, .. } if status.field(shift, 2) == 0b01 => {
            snand::get_feature(master, ctx, opcodes::FEATURE_STATUS_EXT)?
        }
        EccVariant::AuxRegister { shift, .. }
            if matches!(status.field(shift, 2), 0b01 | 0b11) =>
        {
            snand::read_mx_ecc_status(master, ctx)?
        }
        _ => 0,
    };
    Ok(classify(variant, status.bits(), aux))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedMaster;

    const TWO_BIT: EccVariant = EccVariant::Status2Bit { shift: 4 };
    const THREE_BIT: EccVariant = EccVariant::Status3Bit { shift: 4 };
    const EXTENDED: EccVariant = EccVariant::StatusExtended {
        shift: 4,
        ext_shift: 4,
    };
    const AUX: EccVariant = EccVariant::AuxRegister { shift: 4, limit: 3 };

    #[test]
    fn test_two_bit() {
        assert_eq!(classify(TWO_BIT, 0x00, 0), EccStatus::Good);
        assert_eq!(classify(TWO_BIT, 0x10, 0), EccStatus::Good);
        assert_eq!(classify(TWO_BIT, 0x20, 0), EccStatus::Error);
        assert_eq!(classify(TWO_BIT, 0x30, 0), EccStatus::Limit);
        // Bits outside the field are ignored
        assert_eq!(classify(TWO_BIT, 0x0F, 0), EccStatus::Good);
    }

    #[test]
    fn test_three_bit() {
        assert_eq!(classify(THREE_BIT, 0b001 << 4, 0), EccStatus::Good);
        assert_eq!(classify(THREE_BIT, 0b011 << 4, 0), EccStatus::Good);
        assert_eq!(classify(THREE_BIT, 0b101 << 4, 0), EccStatus::Limit);
        assert_eq!(classify(THREE_BIT, 0b010 << 4, 0), EccStatus::Error);
        assert_eq!(classify(THREE_BIT, 0b111 << 4, 0), EccStatus::Error);
    }

    #[test]
    fn test_uncorrectable_ignores_extended_bits() {
        for ext in 0..=0xFFu8 {
            assert_eq!(classify(EXTENDED, 0x20, ext), EccStatus::Error);
            assert_eq!(classify(AUX, 0x20, ext), EccStatus::Error);
        }
    }

    #[test]
    fn test_extended() {
        assert_eq!(classify(EXTENDED, 0x00, 0x30), EccStatus::Good);
        assert_eq!(classify(EXTENDED, 0x10, 0x00), EccStatus::Good);
        assert_eq!(classify(EXTENDED, 0x10, 0x20), EccStatus::Good);
        assert_eq!(classify(EXTENDED, 0x10, 0x30), EccStatus::Limit);
        assert_eq!(classify(EXTENDED, 0x30, 0x00), EccStatus::Limit);
    }

    #[test]
    fn test_aux_register() {
        assert_eq!(classify(AUX, 0x10, 2), EccStatus::Good);
        assert_eq!(classify(AUX, 0x10, 3), EccStatus::Limit);
        assert_eq!(classify(AUX, 0x30, 0xF4), EccStatus::Limit);
    }

    #[test]
    fn test_check_ecc_reads_second_register_only_when_needed() {
        let mut master = ScriptedMaster::new();
        master.set_feature(opcodes::FEATURE_STATUS_EXT, 0x30);

        let ecc = check_ecc(&mut master, ExecContext::Normal, EXTENDED, StatusReg(0x20)).unwrap();
        assert_eq!(ecc, EccStatus::Error);
        assert!(master.opcodes().is_empty());

        let ecc = check_ecc(&mut master, ExecContext::Normal, EXTENDED, StatusReg(0x10)).unwrap();
        assert_eq!(ecc, EccStatus::Limit);
        assert_eq!(master.opcodes(), &[opcodes::GET_FEATURE]);
    }

    #[test]
    fn test_check_ecc_aux_count() {
        let mut master = ScriptedMaster::new();
        master.set_aux_ecc(4);

        let ecc = check_ecc(&mut master, ExecContext::Normal, AUX, StatusReg(0x10)).unwrap();
        assert_eq!(ecc, EccStatus::Limit);
        assert_eq!(master.opcodes(), &[opcodes::MX_GET_ECC_STATUS]);

        let ecc = check_ecc(&mut master, ExecContext::Normal, TWO_BIT, StatusReg(0x10)).unwrap();
        assert_eq!(ecc, EccStatus::Good);
        assert_eq!(master.opcodes().len(), 1);
    }

    #[test]
    fn test_worst() {
        assert_eq!(EccStatus::Good.worst(EccStatus::Limit), EccStatus::Limit);
        assert_eq!(EccStatus::Error.worst(EccStatus::Limit), EccStatus::Error);
    }
}
