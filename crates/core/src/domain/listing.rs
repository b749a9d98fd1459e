use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SellerId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Active,
    Sold,
    Inactive,
}

/// A seller's free-text crop listing. Read-only to the matching pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogListing {
    pub id: ListingId,
    pub seller_id: SellerId,
    #[serde(default)]
    pub plant_name: String,
    #[serde(default)]
    pub scientific_name: Option<String>,
    pub quantity: u32,
    pub price: Decimal,
    pub status: ListingStatus,
}

impl CatalogListing {
    pub fn is_available(&self) -> bool {
        self.status == ListingStatus::Active && self.quantity > 0
    }
}

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    listings: Vec<CatalogListing>,
}

impl Catalog {
    pub fn new(listings: Vec<CatalogListing>) -> Self {
        Self { listings }
    }

    /// Parses a JSON array of listings. A document that is not a listing array,
    /// or that carries a negative price, is rejected as invalid input.
    pub fn from_json(raw: &str) -> Result<Self, DomainError> {
        let listings: Vec<CatalogListing> = serde_json::from_str(raw)
            .map_err(|error| DomainError::InvalidInput(format!("catalog is malformed: {error}")))?;

        if let Some(listing) = listings.iter().find(|listing| listing.price.is_sign_negative()) {
            return Err(DomainError::InvalidInput(format!(
                "listing `{}` has a negative price",
                listing.id.0
            )));
        }

        Ok(Self::new(listings))
    }

    pub fn listings(&self) -> &[CatalogListing] {
        &self.listings
    }

    pub fn find(&self, listing_id: &ListingId) -> Option<&CatalogListing> {
        self.listings.iter().find(|listing| &listing.id == listing_id)
    }

    /// Listings a buyer can purchase right now, in catalog order.
    pub fn active_listings(&self) -> Vec<CatalogListing> {
        self.listings.iter().filter(|listing| listing.is_available()).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{Catalog, CatalogListing, ListingId, ListingStatus, SellerId};
    use crate::errors::DomainError;

    fn listing(id: &str, quantity: u32, status: ListingStatus) -> CatalogListing {
        CatalogListing {
            id: ListingId(id.to_string()),
            seller_id: SellerId("seller-1".to_string()),
            plant_name: "Tomato".to_string(),
            scientific_name: None,
            quantity,
            price: Decimal::new(450, 2),
            status,
        }
    }

    #[test]
    fn active_listings_skip_sold_inactive_and_empty_stock() {
        let catalog = Catalog::new(vec![
            listing("l-1", 4, ListingStatus::Active),
            listing("l-2", 0, ListingStatus::Active),
            listing("l-3", 2, ListingStatus::Sold),
            listing("l-4", 2, ListingStatus::Inactive),
            listing("l-5", 1, ListingStatus::Active),
        ]);

        let ids: Vec<String> =
            catalog.active_listings().into_iter().map(|listing| listing.id.0).collect();
        assert_eq!(ids, vec!["l-1".to_string(), "l-5".to_string()]);
    }

    #[test]
    fn from_json_reads_camel_case_listings() {
        let catalog = Catalog::from_json(
            r#"[{"id": "l-1", "sellerId": "s-9", "plantName": "Wild Rose",
                 "scientificName": "Rosa rubiginosa", "quantity": 5, "price": "12.50",
                 "status": "active"}]"#,
        )
        .expect("catalog should parse");

        assert_eq!(catalog.len(), 1);
        let listing = catalog.find(&ListingId("l-1".to_string())).expect("listing l-1");
        assert_eq!(listing.scientific_name.as_deref(), Some("Rosa rubiginosa"));
        assert_eq!(listing.price, Decimal::new(1250, 2));
    }

    #[test]
    fn from_json_rejects_non_array_documents() {
        let error = Catalog::from_json(r#"{"listings": []}"#).expect_err("object is not a catalog");
        assert!(matches!(error, DomainError::InvalidInput(ref message) if message.contains("malformed")));
    }

    #[test]
    fn from_json_rejects_negative_prices() {
        let error = Catalog::from_json(
            r#"[{"id": "l-1", "sellerId": "s-1", "plantName": "Basil", "quantity": 1,
                 "price": "-1.00", "status": "active"}]"#,
        )
        .expect_err("negative price");
        assert!(matches!(error, DomainError::InvalidInput(ref message) if message.contains("l-1")));
    }

    #[test]
    fn empty_array_is_an_empty_catalog() {
        let catalog = Catalog::from_json("[]").expect("empty catalog parses");
        assert!(catalog.is_empty());
        assert!(catalog.active_listings().is_empty());
    }
}
