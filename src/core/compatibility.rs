use crate::models::BloodType::{self, *};

impl BloodType {
    /// Recipient groups this donor group may give red cells to
    pub fn recipients(&self) -> &'static [BloodType] {
        match self {
            ONeg => &[ONeg, OPos, ANeg, APos, BNeg, BPos, AbNeg, AbPos],
            OPos => &[OPos, APos, BPos, AbPos],
            ANeg => &[ANeg, APos, AbNeg, AbPos],
            APos => &[APos, AbPos],
            BNeg => &[BNeg, BPos, AbNeg, AbPos],
            BPos => &[BPos, AbPos],
            AbNeg => &[AbNeg, AbPos],
            AbPos => &[AbPos],
        }
    }

    #[inline]
    pub fn can_donate_to(&self, recipient: BloodType) -> bool {
        self.recipients().contains(&recipient)
    }
}

/// Check whether a donor's blood group may be transfused into a recipient
///
/// Both sides are raw strings as stored on donor and request records.
/// Anything that does not parse as one of the eight ABO/Rh groups is
/// treated as incompatible.
#[inline]
pub fn is_compatible_blood_group(donor_type: &str, recipient_type: &str) -> bool {
    match (donor_type.parse::<BloodType>(), recipient_type.parse::<BloodType>()) {
        (Ok(donor), Ok(recipient)) => donor.can_donate_to(recipient),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_universal_donor_and_recipient() {
        for bt in BloodType::ALL {
            assert!(ONeg.can_donate_to(bt), "O- should donate to {}", bt);
            assert!(bt.can_donate_to(AbPos), "{} should donate to AB+", bt);
        }
    }

    #[test]
    fn test_rh_positive_never_gives_to_rh_negative() {
        for donor in BloodType::ALL.iter().filter(|b| !b.is_rh_negative()) {
            for recipient in BloodType::ALL.iter().filter(|b| b.is_rh_negative()) {
                assert!(!donor.can_donate_to(*recipient), "{} -> {}", donor, recipient);
            }
        }
    }

    #[test]
    fn test_string_lookup() {
        assert!(is_compatible_blood_group("O-", "AB+"));
        assert!(!is_compatible_blood_group("AB+", "O-"));
        assert!(is_compatible_blood_group("A+", "A+"));
        assert!(is_compatible_blood_group("b-", "AB-"));
    }

    #[test]
    fn test_malformed_fails_closed() {
        assert!(!is_compatible_blood_group("", "A+"));
        assert!(!is_compatible_blood_group("O-", "unknown"));
        assert!(!is_compatible_blood_group("X+", "X+"));
    }

    #[test]
    fn test_every_type_gives_to_itself() {
        for bt in BloodType::ALL {
            assert!(bt.can_donate_to(bt));
        }
    }
}
