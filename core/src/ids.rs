//! Newtyped domain identifiers.
//!
//! Every identifier that crosses a module boundary is its own type rather
//! than a bare [`uuid::Uuid`], so a `WalletId` can never be passed where a
//! `SwapId` is expected.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(
            Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new(rng: &mut impl crate::rng::Crng) -> Self {
                let mut bytes = [0u8; 16];
                crate::rng::RngCore::fill_bytes(rng, &mut bytes);
                Self(Uuid::from_bytes(bytes))
            }

            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            pub fn as_uuid(self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_id!(SwapId);
uuid_id!(WalletId);
uuid_id!(MemoId);

#[cfg(test)]
mod test {
    use super::*;
    use crate::rng::SysRng;

    #[test]
    fn distinct_ids_on_each_call() {
        let mut rng = SysRng::new();
        let a = SwapId::new(&mut rng);
        let b = SwapId::new(&mut rng);
        assert_ne!(a, b);
    }

    #[test]
    fn display_and_parse_roundtrip() {
        let mut rng = SysRng::new();
        let id = WalletId::new(&mut rng);
        let parsed: WalletId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }
}
