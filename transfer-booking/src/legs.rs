use transfer_catalog::RouteCatalog;
use transfer_core::{BookingDraft, LegDirection, TripLeg};
use transfer_shared::Money;

/// Pickup and drop-off for the outbound drive.
///
/// Hubs (airport, station, port, hotel) are where the driver meets the
/// customer, so a customer-supplied address replaces the non-hub end.
pub fn outbound_addresses(routes: &RouteCatalog, draft: &BookingDraft) -> Option<(String, String)> {
    let (origin, destination) = draft.route()?;
    let address = draft.contact.pickup_address();
    let is_hub = |name: &str| routes.location(name).is_some_and(|l| l.is_hub());

    let pair = if is_hub(origin) {
        (origin, address.unwrap_or(destination))
    } else {
        (address.unwrap_or(origin), destination)
    };
    Some((pair.0.to_string(), pair.1.to_string()))
}

/// Split a confirmed draft into the drives it stands for. A round trip
/// returns along the reversed addresses; the odd cent of the total stays on
/// the outbound leg.
pub fn build_legs(routes: &RouteCatalog, draft: &BookingDraft, total: Money) -> Option<Vec<TripLeg>> {
    let (origin, destination) = draft.route()?;
    let (pickup, dropoff) = outbound_addresses(routes, draft)?;
    let flight_number = draft
        .contact
        .flight_number
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string);

    if !draft.is_round_trip() {
        return Some(vec![TripLeg {
            direction: LegDirection::Outbound,
            origin: origin.to_string(),
            destination: destination.to_string(),
            date: draft.date?,
            time: draft.time?,
            pickup_address: pickup,
            dropoff_address: dropoff,
            flight_number,
            price: total,
        }]);
    }

    let (outbound_price, return_price) = total.split_in_two();
    Some(vec![
        TripLeg {
            direction: LegDirection::Outbound,
            origin: origin.to_string(),
            destination: destination.to_string(),
            date: draft.date?,
            time: draft.time?,
            pickup_address: pickup.clone(),
            dropoff_address: dropoff.clone(),
            flight_number: flight_number.clone(),
            price: outbound_price,
        },
        TripLeg {
            direction: LegDirection::Return,
            origin: destination.to_string(),
            destination: origin.to_string(),
            date: draft.return_date?,
            time: draft.return_time?,
            pickup_address: dropoff,
            dropoff_address: pickup,
            flight_number,
            price: return_price,
        },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use transfer_catalog::testing::{sample_catalog, AIRPORT};
    use transfer_catalog::TripType;

    fn draft(origin: &str, destination: &str) -> BookingDraft {
        let mut draft = BookingDraft::new();
        draft.origin = Some(origin.into());
        draft.destination = Some(destination.into());
        draft.date = NaiveDate::from_ymd_opt(2024, 6, 1);
        draft.time = NaiveTime::from_hms_opt(14, 0, 0);
        draft
    }

    #[test]
    fn test_airport_origin_drops_off_at_address() {
        let catalog = sample_catalog();
        let mut d = draft(AIRPORT, "Benidorm");
        d.contact.pickup_address = Some("Calle Gerona 12".into());

        let (pickup, dropoff) = outbound_addresses(&catalog.routes, &d).unwrap();
        assert_eq!(pickup, AIRPORT);
        assert_eq!(dropoff, "Calle Gerona 12");
    }

    #[test]
    fn test_airport_destination_picks_up_at_address() {
        let catalog = sample_catalog();
        let mut d = draft("Benidorm", AIRPORT);
        d.contact.pickup_address = Some("Calle Gerona 12".into());

        let (pickup, dropoff) = outbound_addresses(&catalog.routes, &d).unwrap();
        assert_eq!(pickup, "Calle Gerona 12");
        assert_eq!(dropoff, AIRPORT);
    }

    #[test]
    fn test_blank_address_falls_back_to_route() {
        let catalog = sample_catalog();
        let mut d = draft("Benidorm", "Altea");
        d.contact.pickup_address = Some("   ".into());

        let (pickup, dropoff) = outbound_addresses(&catalog.routes, &d).unwrap();
        assert_eq!((pickup.as_str(), dropoff.as_str()), ("Benidorm", "Altea"));
    }

    #[test]
    fn test_round_trip_reverses_and_splits_price() {
        let catalog = sample_catalog();
        let mut d = draft(AIRPORT, "Benidorm");
        d.trip_type = TripType::RoundTrip;
        d.return_date = NaiveDate::from_ymd_opt(2024, 6, 8);
        d.return_time = NaiveTime::from_hms_opt(10, 30, 0);
        d.contact.pickup_address = Some("Hotel Bali".into());
        d.contact.flight_number = Some(" FR1234 ".into());

        let legs = build_legs(&catalog.routes, &d, Money::from_cents(12001)).unwrap();
        assert_eq!(legs.len(), 2);

        let (outbound, back) = (&legs[0], &legs[1]);
        assert_eq!(outbound.price, Money::from_cents(6001));
        assert_eq!(back.price, Money::from_cents(6000));
        assert_eq!(back.direction, LegDirection::Return);
        assert_eq!(back.origin, "Benidorm");
        assert_eq!(back.pickup_address, "Hotel Bali");
        assert_eq!(back.dropoff_address, AIRPORT);
        assert_eq!(back.flight_number.as_deref(), Some("FR1234"));
    }

    #[test]
    fn test_incomplete_draft_has_no_legs() {
        let catalog = sample_catalog();
        let mut d = draft(AIRPORT, "Benidorm");
        d.trip_type = TripType::RoundTrip;
        assert!(build_legs(&catalog.routes, &d, Money::from_euros(120)).is_none());
    }
}
