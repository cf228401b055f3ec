use chrono::offset::FixedOffset;
use chrono::DateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::web::dto::{ProductRespDto, VariationPriceRespDto, VariationRespDto};

#[derive(Debug, Clone, PartialEq)]
pub struct ProductVariationModel {
    pub name: String,
    pub list_price: Decimal,
    pub sale_price: Option<Decimal>,
    pub sale_expires_at: Option<DateTime<FixedOffset>>,
}

// the price a shopper actually pays for one variation at a given moment
#[derive(Debug, Clone, PartialEq)]
pub struct VariationPriceModel {
    pub current: Decimal,
    pub original: Decimal,
    pub sale_active: bool,
}

pub struct ProductModel {
    pub id: u64,
    pub name: String,
    pub category_id: Option<u32>,
    pub category_name: Option<String>,
    pub variations: Vec<ProductVariationModel>,
}

// raw variation entry as persisted in the catalog column, every field is
// optional because upstream tooling never enforced the shape
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct VariationSrcEntry {
    name: Option<String>,
    price: Option<Decimal>,
    sale_price: Option<Decimal>,
    sale_price_expires_at: Option<String>,
}

impl ProductVariationModel {
    pub fn resolve_price(&self, now: DateTime<FixedOffset>) -> VariationPriceModel {
        let sale_active = match (self.sale_price.as_ref(), self.sale_expires_at.as_ref()) {
            (Some(_), None) => true,
            (Some(_), Some(t)) => *t > now,
            (None, _) => false,
        };
        let current = if sale_active {
            self.sale_price.unwrap_or(self.list_price)
        } else {
            self.list_price
        };
        VariationPriceModel {
            current,
            original: self.list_price,
            sale_active,
        }
    }
} // end of impl ProductVariationModel

impl ProductModel {
    // Decode the stored variation list, silently skipping entries that miss
    // a price. An expiry timestamp which fails to parse invalidates only the
    // sale price of its entry, the list price is still served.
    pub fn parse_variations(raw: &str) -> Vec<ProductVariationModel> {
        let entries = match serde_json::from_str::<Vec<VariationSrcEntry>>(raw) {
            Ok(v) => v,
            Err(_) => Vec::new(),
        };
        entries
            .into_iter()
            .filter_map(|e| {
                let list_price = e.price?;
                let expiry_raw = e.sale_price_expires_at.as_deref().map(str::trim);
                let parsed_expiry = match expiry_raw {
                    Some(s) if !s.is_empty() => match DateTime::parse_from_rfc3339(s) {
                        Ok(t) => Some(Some(t)),
                        Err(_) => None, // unparseable, discard the sale entirely
                    },
                    _ => Some(None),
                };
                let (sale_price, sale_expires_at) = match parsed_expiry {
                    Some(exp) => (e.sale_price, exp),
                    None => (None, None),
                };
                Some(ProductVariationModel {
                    name: e.name.unwrap_or_default(),
                    list_price,
                    sale_price,
                    sale_expires_at,
                })
            })
            .collect::<Vec<_>>()
    } // end of fn parse_variations

    // inverse of `parse_variations`, repositories persist the list in the
    // same shape the storefront catalog tooling writes
    pub fn render_variations(items: &[ProductVariationModel]) -> String {
        let entries = items
            .iter()
            .map(|v| VariationSrcEntry {
                name: Some(v.name.clone()),
                price: Some(v.list_price),
                sale_price: v.sale_price,
                sale_price_expires_at: v.sale_expires_at.map(|t| t.to_rfc3339()),
            })
            .collect::<Vec<_>>();
        serde_json::to_string(&entries).unwrap_or_default()
    }

    pub fn price_range(&self, now: DateTime<FixedOffset>) -> Option<(Decimal, Decimal)> {
        let mut bounds: Option<(Decimal, Decimal)> = None;
        for v in self.variations.iter() {
            let p = v.resolve_price(now).current;
            bounds = match bounds {
                Some((lo, hi)) => Some((lo.min(p), hi.max(p))),
                None => Some((p, p)),
            };
        }
        bounds
    }

    pub fn into_dto(self, now: DateTime<FixedOffset>) -> ProductRespDto {
        let (lowest_price, highest_price) = match self.price_range(now) {
            Some((lo, hi)) => (Some(lo), Some(hi)),
            None => (None, None),
        };
        let variations = self
            .variations
            .into_iter()
            .map(|v| {
                let rp = v.resolve_price(now);
                VariationRespDto {
                    name: v.name,
                    price: v.list_price,
                    sale_price: v.sale_price,
                    sale_price_expires_at: v.sale_expires_at,
                    resolved: VariationPriceRespDto {
                        current: rp.current,
                        original: rp.original,
                        sale_active: rp.sale_active,
                    },
                }
            })
            .collect::<Vec<_>>();
        ProductRespDto {
            id: self.id,
            name: self.name,
            category_id: self.category_id,
            category_name: self.category_name,
            lowest_price,
            highest_price,
            variations,
        }
    } // end of fn into_dto
} // end of impl ProductModel
