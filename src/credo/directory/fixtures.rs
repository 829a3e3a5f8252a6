//! Sample provider data standing in for the directory database, the web
//! scraper and the reasoning service.
//!
//! Each fixture pairs a database record with the record a scrape would
//! return, plus the confidence score the reasoning service is expected to
//! report for the pair.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

use super::record::ProviderRecord;

/// One canned verification scenario
#[derive(Debug, Clone)]
pub struct Fixture {
    pub database: ProviderRecord,
    pub scraped: ProviderRecord,
    pub confidence: u8,
}

struct Entry {
    name: &'static str,
    specialty: &'static str,
    phone: &'static str,
    address: &'static str,
    city: &'static str,
    state: &'static str,
    zip: &'static str,
    license_number: &'static str,
    npi: &'static str,
}

impl Entry {
    fn into_record(self, id: &str) -> ProviderRecord {
        ProviderRecord {
            id: id.to_string(),
            name: self.name.to_string(),
            specialty: self.specialty.to_string(),
            phone: self.phone.to_string(),
            address: self.address.to_string(),
            city: self.city.to_string(),
            state: self.state.to_string(),
            zip: self.zip.to_string(),
            license_number: self.license_number.to_string(),
            npi: self.npi.to_string(),
        }
    }
}

/// Build a fixture whose scraped record differs only in `phone` and/or `address`
fn fixture(
    id: &str,
    base: Entry,
    phone: Option<&str>,
    address: Option<&str>,
    confidence: u8,
) -> Fixture {
    let database = base.into_record(id);
    let mut scraped = database.clone();
    if let Some(phone) = phone {
        scraped.phone = phone.to_string();
    }
    if let Some(address) = address {
        scraped.address = address.to_string();
    }
    Fixture {
        database,
        scraped,
        confidence,
    }
}

static FIXTURES: Lazy<BTreeMap<&'static str, Fixture>> = Lazy::new(|| {
    let mut table = BTreeMap::new();

    table.insert(
        "1001",
        fixture(
            "1001",
            Entry {
                name: "Dr. Rajesh Kumar",
                specialty: "Cardiology",
                phone: "+91-11-2658-3456",
                address: "A-123, Green Park",
                city: "New Delhi",
                state: "Delhi",
                zip: "110016",
                license_number: "MCI/DEL/12345/2010",
                npi: "9876543210",
            },
            None,
            None,
            95,
        ),
    );
    table.insert(
        "1002",
        fixture(
            "1002",
            Entry {
                name: "Dr. Priya Sharma",
                specialty: "Pediatrics",
                phone: "+91-22-2645-7890",
                address: "B-456, Bandra West",
                city: "Mumbai",
                state: "Maharashtra",
                zip: "400050",
                license_number: "MCI/MAH/23456/2012",
                npi: "8765432109",
            },
            None,
            None,
            92,
        ),
    );
    table.insert(
        "1003",
        fixture(
            "1003",
            Entry {
                name: "Dr. Amit Patel",
                specialty: "Orthopedics",
                phone: "+91-79-2658-1234",
                address: "C-789, Satellite",
                city: "Ahmedabad",
                state: "Gujarat",
                zip: "380015",
                license_number: "MCI/GUJ/34567/2015",
                npi: "7654321098",
            },
            None,
            Some("C-789, Satellite Area"),
            88,
        ),
    );
    table.insert(
        "2001",
        fixture(
            "2001",
            Entry {
                name: "Dr. Anjali Reddy",
                specialty: "Dermatology",
                phone: "+91-40-2789-4567",
                address: "D-321, Banjara Hills",
                city: "Hyderabad",
                state: "Telangana",
                zip: "500034",
                license_number: "MCI/TEL/45678/2011",
                npi: "6543210987",
            },
            Some("+91-40-2789-4568"),
            None,
            78,
        ),
    );
    table.insert(
        "2002",
        fixture(
            "2002",
            Entry {
                name: "Dr. Vikram Singh",
                specialty: "Neurology",
                phone: "+91-80-2558-9876",
                address: "E-654, Koramangala",
                city: "Bangalore",
                state: "Karnataka",
                zip: "560095",
                license_number: "MCI/KAR/56789/2013",
                npi: "5432109876",
            },
            None,
            Some("E-654, Koramangala 5th Block"),
            75,
        ),
    );
    table.insert(
        "3001",
        fixture(
            "3001",
            Entry {
                name: "Dr. Meera Nair",
                specialty: "Gynecology",
                phone: "+91-44-2845-2345",
                address: "F-987, T. Nagar",
                city: "Chennai",
                state: "Tamil Nadu",
                zip: "600017",
                license_number: "MCI/TN/67890/2014",
                npi: "4321098765",
            },
            Some("+91-44-2845-2346"),
            Some("F-987, Thyagaraya Nagar"),
            65,
        ),
    );
    table.insert(
        "3002",
        fixture(
            "3002",
            Entry {
                name: "Dr. Ravi Iyer",
                specialty: "Oncology",
                phone: "+91-33-2445-6789",
                address: "G-147, Salt Lake",
                city: "Kolkata",
                state: "West Bengal",
                zip: "700064",
                license_number: "MCI/WB/78901/2016",
                npi: "3210987654",
            },
            Some("+91-33-2445-6790"),
            Some("G-147, Salt Lake City"),
            68,
        ),
    );
    table.insert(
        "4001",
        fixture(
            "4001",
            Entry {
                name: "Dr. Kavita Desai",
                specialty: "Endocrinology",
                phone: "+91-20-2558-3456",
                address: "H-258, Koregaon Park",
                city: "Pune",
                state: "Maharashtra",
                zip: "411001",
                license_number: "MCI/MAH/89012/2017",
                npi: "2109876543",
            },
            None,
            None,
            90,
        ),
    );

    table
});

/// Look up a fixture by provider id
pub fn get(provider_id: &str) -> Option<&'static Fixture> {
    FIXTURES.get(provider_id.trim())
}

/// All fixtures in id order
pub fn all() -> impl Iterator<Item = (&'static str, &'static Fixture)> {
    FIXTURES.iter().map(|(id, f)| (*id, f))
}
