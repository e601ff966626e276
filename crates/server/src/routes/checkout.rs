//! Credit pack checkout route handlers.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;
use tryon_core::{CheckoutRequest, CheckoutResponse, CreditPack, PackId, Price};

use crate::error::{AppError, add_breadcrumb};
use crate::extract::ApiJson;
use crate::state::AppState;

/// A pack as listed to the frontend.
#[derive(Debug, Serialize)]
pub struct PackListing {
    pub id: PackId,
    pub credits: u32,
    pub name: &'static str,
    pub price: Price,
    pub display_price: String,
}

/// List the purchasable credit packs.
#[instrument(skip(state))]
pub async fn list_packs(State(state): State<AppState>) -> Json<Vec<PackListing>> {
    let currency = state.checkout().currency();
    let packs = CreditPack::all()
        .into_iter()
        .map(|pack| {
            let price = pack.price(currency);
            PackListing {
                id: pack.id,
                credits: pack.credits,
                name: pack.name,
                display_price: price.display(),
                price,
            }
        })
        .collect();

    Json(packs)
}

/// Create a Stripe checkout session for a credit pack.
#[instrument(skip(state, request), fields(pack_id = %request.pack_id))]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, AppError> {
    add_breadcrumb(
        "checkout",
        "Checkout session requested",
        Some(&[("pack_id", request.pack_id.as_str())]),
    );

    let url = state
        .checkout()
        .create_session(
            &request.pack_id,
            request.success_url.as_deref(),
            request.cancel_url.as_deref(),
        )
        .await?;

    Ok(Json(CheckoutResponse { url }))
}
