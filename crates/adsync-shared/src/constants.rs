/// Marketplace category: Fordon > Bilar
pub const CATEGORY_CARS: u32 = 1020;

/// Marketplace category: Fordon > Transportbilar
pub const CATEGORY_TRANSPORT_VEHICLES: u32 = 1021;

/// Marketplace category: Fordon > Motorcykel
pub const CATEGORY_MOTORCYCLES: u32 = 1140;

/// Marketplace category: Fordon > Trailer
pub const CATEGORY_TRAILERS: u32 = 1045;

/// Marketplace category: Fordon > Husvagn
pub const CATEGORY_CARAVANS: u32 = 1101;

/// Marketplace category: Fordon > Husbil
pub const CATEGORY_MOTORHOMES: u32 = 1102;

/// Marketplace category: Fordon > ATV
pub const CATEGORY_ATV: u32 = 1143;

/// Marketplace category: Fordon > Snöskoter
pub const CATEGORY_SNOWMOBILES: u32 = 1180;

/// Marketplace category: Fordon > Båtar > Motorbåt
pub const CATEGORY_BOATS_MOTOR: u32 = 1061;

/// Marketplace category: Fordon > Båtar > Segelbåt
pub const CATEGORY_BOATS_SAIL: u32 = 1062;

/// Marketplace category: Fordon > Mopeder & A-traktor > Mopeder
pub const CATEGORY_MOPEDS: u32 = 1121;

/// Marketplace category: Fordon > Mopeder & A-traktor > A-Traktorer
pub const CATEGORY_A_TRACTORS: u32 = 1122;

/// Marketplace category: Fordon > Lastbil, truck & entreprenad > Lastbil & buss
pub const CATEGORY_TRUCKS: u32 = 1221;

/// Every vehicle category the marketplace accepts from dealers.
pub const VEHICLE_CATEGORIES: &[u32] = &[
    CATEGORY_CARS,
    CATEGORY_TRANSPORT_VEHICLES,
    CATEGORY_MOTORCYCLES,
    CATEGORY_TRAILERS,
    CATEGORY_CARAVANS,
    CATEGORY_MOTORHOMES,
    CATEGORY_ATV,
    CATEGORY_SNOWMOBILES,
    CATEGORY_BOATS_MOTOR,
    CATEGORY_BOATS_SAIL,
    CATEGORY_MOPEDS,
    CATEGORY_A_TRACTORS,
    CATEGORY_TRUCKS,
];

pub fn is_known_category(id: u32) -> bool {
    VEHICLE_CATEGORIES.contains(&id)
}

/// Currency used for every price sent to the marketplace
pub const DEFAULT_CURRENCY: &str = "SEK";

/// Largest accepted price, in whole currency units
pub const MAX_PRICE: f64 = 1_000_000_000_000.0;

/// Pro Import API base URL
pub const DEFAULT_MARKETPLACE_URL: &str = "https://api.blocket.se/pro-import-api/v3";

/// Dealer code used when the ad owner has no dealership on file
pub const DEFAULT_DEALER_CODE: &str = "DEFAULT_DEALER";

/// Default HTTP API port
pub const DEFAULT_HTTP_PORT: u16 = 5000;

/// Default per-call marketplace timeout in seconds
pub const DEFAULT_MARKETPLACE_TIMEOUT_SECS: u64 = 15;
