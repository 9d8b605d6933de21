use crate::domain::{Facility, GeoPoint};

use super::distance_km;

/// Find the facility closest to `user` by great-circle distance.
///
/// Linear scan over every candidate. Exact distance ties go to the lowest
/// facility id, so the result does not depend on the order rows arrived in.
/// Returns `None` for an empty input.
pub fn nearest<'a, F, I>(user: GeoPoint, facilities: I) -> Option<&'a F>
where
    F: Facility + 'a,
    I: IntoIterator<Item = &'a F>,
{
    let mut best: Option<(&'a F, f64)> = None;

    for facility in facilities {
        let distance = distance_km(user, facility.location());
        let closer = match best {
            None => true,
            Some((current, current_distance)) => {
                distance < current_distance
                    || (distance == current_distance && facility.id() < current.id())
            }
        };
        if closer {
            best = Some((facility, distance));
        }
    }

    best.map(|(facility, _)| facility)
}
