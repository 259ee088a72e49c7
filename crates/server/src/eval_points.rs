// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use prio_mpc::CheckerPrecomp;
use std::sync::Arc;

/// The current and previous evaluation point of one leader, tagged with
/// their epochs.
///
/// Keeping the previous point lets requests that started before a rotation
/// finish under the point they started with.
#[derive(Debug, Default)]
pub struct EvalPoints {
    current: Option<(u64, Arc<CheckerPrecomp>)>,
    previous: Option<(u64, Arc<CheckerPrecomp>)>,
}

impl EvalPoints {
    pub fn current_epoch(&self) -> Option<u64> {
        self.current.as_ref().map(|(epoch, _)| *epoch)
    }

    pub fn get(&self, epoch: u64) -> Option<Arc<CheckerPrecomp>> {
        [&self.current, &self.previous]
            .into_iter()
            .flatten()
            .find(|(e, _)| *e == epoch)
            .map(|(_, precomp)| precomp.clone())
    }

    /// Installs `precomp` as the newest point. Returns the current epoch when
    /// `epoch` is not newer than it.
    pub fn rotate(&mut self, epoch: u64, precomp: Arc<CheckerPrecomp>) -> Result<(), u64> {
        if let Some(current) = self.current_epoch() {
            if epoch <= current {
                return Err(current);
            }
        }
        self.previous = self.current.replace((epoch, precomp));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;
    use prio_circuit::Circuit;
    use prio_field::{Field, FieldPreset};
    use prio_mpc::CircuitDomain;

    fn precomp(x: u32) -> Arc<CheckerPrecomp> {
        let field = Field::preset(FieldPreset::P63);
        let domain = Arc::new(CircuitDomain::new(&field, &Circuit::new()).unwrap());
        Arc::new(CheckerPrecomp::new(&field, domain, BigUint::from(x)))
    }

    #[test]
    fn keeps_two_epochs() {
        let mut points = EvalPoints::default();
        assert!(points.get(0).is_none());

        points.rotate(1, precomp(11)).unwrap();
        points.rotate(2, precomp(12)).unwrap();
        assert_eq!(points.get(1).unwrap().x(), &BigUint::from(11u32));
        assert_eq!(points.get(2).unwrap().x(), &BigUint::from(12u32));

        points.rotate(3, precomp(13)).unwrap();
        assert!(points.get(1).is_none());
        assert_eq!(points.current_epoch(), Some(3));
    }

    #[test]
    fn stale_epochs_are_refused() {
        let mut points = EvalPoints::default();
        points.rotate(5, precomp(2)).unwrap();
        assert_eq!(points.rotate(5, precomp(3)), Err(5));
        assert_eq!(points.rotate(4, precomp(3)), Err(5));
        assert_eq!(points.get(5).unwrap().x(), &BigUint::from(2u32));
    }
}
