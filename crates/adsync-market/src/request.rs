use adsync_shared::constants::CATEGORY_CARS;
use adsync_shared::{vehicle_source_id, ContactInfo, Vehicle};
use chrono::{DateTime, Utc};

use crate::wire::{AdRequest, Price};

/// Build a create request for `vehicle`.
///
/// When `source_id` is `None` a fresh `vehicle-{id}-{unix_millis}` key is
/// generated. The ad defaults to the cars category with a negotiable SEK
/// price taken from the vehicle.
pub fn vehicle_to_request(
    vehicle: &Vehicle,
    dealer_code: &str,
    contact: &ContactInfo,
    source_id: Option<&str>,
) -> AdRequest {
    vehicle_to_request_at(vehicle, dealer_code, contact, source_id, Utc::now())
}

pub(crate) fn vehicle_to_request_at(
    vehicle: &Vehicle,
    dealer_code: &str,
    contact: &ContactInfo,
    source_id: Option<&str>,
    now: DateTime<Utc>,
) -> AdRequest {
    let source_id = source_id
        .map(str::to_string)
        .unwrap_or_else(|| vehicle_source_id(&vehicle.id, now));

    AdRequest {
        source_id,
        dealer_code: Some(dealer_code.to_string()),
        category_id: CATEGORY_CARS,
        title: vehicle_title(vehicle),
        body: vehicle_body(vehicle),
        price: vec![Price::negotiable(vehicle.price.unwrap_or(0.0))],
        image_urls: Vec::new(),
        url: None,
        location: None,
        contact: contact.clone(),
    }
}

fn vehicle_title(vehicle: &Vehicle) -> String {
    let mut title = format!("{} {} {}", vehicle.year, vehicle.make, vehicle.model);
    if let Some(trim) = vehicle.trim.as_deref().filter(|t| !t.is_empty()) {
        title.push(' ');
        title.push_str(trim);
    }
    title
}

fn vehicle_body(vehicle: &Vehicle) -> String {
    let mut lines = Vec::with_capacity(5);

    let mut intro = format!("Beautiful {} {} {}", vehicle.year, vehicle.make, vehicle.model);
    if let Some(color) = vehicle.color.as_deref().filter(|c| !c.is_empty()) {
        intro.push_str(&format!(" in {color} color"));
    }
    intro.push('.');
    lines.push(intro);

    if let Some(mileage) = vehicle.mileage {
        lines.push(format!("Mileage: {mileage} km"));
    }
    lines.push(format!("VIN: {}", vehicle.vin));
    lines.push(String::new());
    lines.push("Contact us for more information and to schedule a test drive!".to_string());

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn accord() -> Vehicle {
        Vehicle {
            id: "1".into(),
            vin: "1HGCM82633A123456".into(),
            make: "Honda".into(),
            model: "Accord".into(),
            year: 2024,
            trim: Some("LX".into()),
            color: Some("Silver".into()),
            mileage: Some(50),
            price: Some(28500.0),
        }
    }

    fn contact() -> ContactInfo {
        ContactInfo {
            name: "John Smith".into(),
            phone: Some("(555) 123-4567".into()),
            email: Some("john@automax.com".into()),
            company: Some("AutoMax Dealership".into()),
        }
    }

    #[test]
    fn test_generates_source_id() {
        let now = Utc.timestamp_millis_opt(1000).unwrap();
        let req = vehicle_to_request_at(&accord(), "AUTOMAX", &contact(), None, now);
        assert_eq!(req.source_id, "vehicle-1-1000");
        assert_eq!(req.dealer_code.as_deref(), Some("AUTOMAX"));
        assert_eq!(req.category_id, CATEGORY_CARS);
    }

    #[test]
    fn test_keeps_supplied_source_id() {
        let req = vehicle_to_request(&accord(), "AUTOMAX", &contact(), Some("v-1-1000"));
        assert_eq!(req.source_id, "v-1-1000");
    }

    #[test]
    fn test_title_and_body() {
        let req = vehicle_to_request(&accord(), "AUTOMAX", &contact(), Some("s"));
        assert_eq!(req.title, "2024 Honda Accord LX");

        let lines: Vec<&str> = req.body.lines().collect();
        assert_eq!(lines[0], "Beautiful 2024 Honda Accord in Silver color.");
        assert_eq!(lines[1], "Mileage: 50 km");
        assert_eq!(lines[2], "VIN: 1HGCM82633A123456");
        assert!(lines.last().unwrap().starts_with("Contact us"));
    }

    #[test]
    fn test_sparse_vehicle() {
        let vehicle = Vehicle {
            trim: None,
            color: None,
            mileage: None,
            price: None,
            ..accord()
        };
        let req = vehicle_to_request(&vehicle, "D", &contact(), Some("s"));
        assert_eq!(req.title, "2024 Honda Accord");
        assert!(!req.body.contains("Mileage"));
        assert!(req.body.starts_with("Beautiful 2024 Honda Accord."));
        assert_eq!(req.price[0].amount, 0);
    }

    #[test]
    fn test_price_is_negotiable_sek() {
        let req = vehicle_to_request(&accord(), "D", &contact(), Some("s"));
        assert_eq!(req.price, vec![Price::negotiable(28500.0)]);
        assert_eq!(req.price[0].currency, "SEK");
        assert_eq!(req.contact, contact());
    }
}
