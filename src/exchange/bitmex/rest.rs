//! REST side of the BitMEX adapter.
//!
//! Every call follows one template: build parameters, sign if the endpoint
//! is private, send through the transport, then decode. An error envelope
//! (`{"error":{"message","name"}}`) becomes [`AdapterError::Api`] whether it
//! arrives with a success or a failure status.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{BitmexExchange, EXCHANGE_NAME};
use crate::auth::signer::{HttpMethod, Params};
use crate::domain::market::wire::{BitmexInstrument, BitmexL2Level, BitmexMargin, BitmexPosition};
use crate::domain::market::{
    depth_from_levels, positions_from_rows, ticker_from_instrument, Balance, Depth, Position,
    Ticker,
};
use crate::domain::order::wire::BitmexOrder;
use crate::domain::order::{Order, OrderRequest};
use crate::domain::trade::Trade;
use crate::error::{AdapterError, AdapterResult, ConfigError};
use crate::exchange::Exchange;
use crate::http::HttpRequest;
use crate::shared::{CurrencyUnit, TradeAction};

/// Levels requested per side from `/orderBook/L2`.
const DEPTH_LEVELS: u32 = 25;

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    name: String,
}

fn api_error(body: &str) -> Option<AdapterError> {
    let env: ErrorEnvelope = serde_json::from_str(body).ok()?;
    tracing::error!(
        name = %env.error.name,
        message = %env.error.message,
        "bitmex: request rejected"
    );
    Some(AdapterError::Api {
        name: env.error.name,
        message: env.error.message,
    })
}

fn decode<T: DeserializeOwned>(path: &str, body: &str) -> AdapterResult<T> {
    if let Some(err) = api_error(body) {
        return Err(err);
    }
    serde_json::from_str(body).map_err(|e| {
        tracing::debug!(path, body, "bitmex: undecodable response");
        AdapterError::Decode(format!("{}: {}", path, e))
    })
}

fn params<const N: usize>(pairs: [(&str, String); N]) -> Params {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

impl BitmexExchange {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.http_host.trim_end_matches('/'), path)
    }

    async fn call_json<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        query: Params,
        body: Params,
        auth: bool,
    ) -> AdapterResult<T> {
        let mut request = HttpRequest::new(method, self.url(path))
            .with_query(query)
            .with_body(body);

        if auth {
            let signer = self
                .signer
                .as_ref()
                .ok_or_else(|| ConfigError::Missing("market.bitmex.api_key".into()))?;
            let headers = signer.sign_request(method, path, &request.query, &request.body)?;
            request = request.with_headers(headers.to_pairs());
        }

        let text = match self.http.call(request).await {
            Ok(text) => text,
            Err(e) => {
                if let Some(err) = e.body().and_then(api_error) {
                    return Err(err);
                }
                return Err(e.into());
            }
        };
        decode(path, &text)
    }

    fn symbol_query(&self) -> Params {
        params([("symbol", self.config.symbol.to_string())])
    }

    async fn instrument(&self) -> AdapterResult<BitmexInstrument> {
        let rows: Vec<BitmexInstrument> = self
            .call_json(HttpMethod::Get, "/instrument", self.symbol_query(), Params::new(), false)
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AdapterError::NotFound(format!("instrument {}", self.config.symbol)))
    }
}

#[async_trait]
impl Exchange for BitmexExchange {
    fn name(&self) -> String {
        format!("{}/{}", EXCHANGE_NAME, self.config.symbol)
    }

    fn currency_unit(&self) -> CurrencyUnit {
        CurrencyUnit::Btc
    }

    fn trades(&self) -> Vec<Trade> {
        self.trades.snapshot()
    }

    async fn make_order(
        &self,
        action: TradeAction,
        amount: Decimal,
        price: Decimal,
    ) -> AdapterResult<Order> {
        let request = OrderRequest::new(self.config.symbol.clone(), action, amount, price);
        let body = request.to_params();
        tracing::debug!(
            side = request.side.as_str(),
            ord_type = request.ord_type.as_str(),
            "bitmex: placing order"
        );
        let order: BitmexOrder = self
            .call_json(HttpMethod::infer(&body), "/order", Params::new(), body, true)
            .await?;
        Ok(order.into())
    }

    async fn cancel_order(&self, ids: &[String]) -> AdapterResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let body = params([("orderID", ids.join(","))]);
        let _: Vec<BitmexOrder> = self
            .call_json(HttpMethod::Delete, "/order", Params::new(), body, true)
            .await?;
        Ok(())
    }

    async fn get_order(&self, id: &str) -> AdapterResult<Order> {
        self.get_orders(&[id.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AdapterError::NotFound(format!("order {}", id)))
    }

    async fn get_orders(&self, ids: &[String]) -> AdapterResult<Vec<Order>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let filter = serde_json::json!({ "orderID": ids }).to_string();
        let query = params([
            ("symbol", self.config.symbol.to_string()),
            ("filter", filter),
        ]);
        let rows: Vec<BitmexOrder> = self
            .call_json(HttpMethod::Get, "/order", query, Params::new(), true)
            .await?;
        Ok(rows.into_iter().map(Order::from).collect())
    }

    async fn ticker(&self) -> AdapterResult<Ticker> {
        let inst = self.instrument().await?;
        Ok(ticker_from_instrument(inst, self.config.price_quote))
    }

    async fn depth(&self) -> AdapterResult<Depth> {
        let query = params([
            ("symbol", self.config.symbol.to_string()),
            ("depth", DEPTH_LEVELS.to_string()),
        ]);
        let levels: Vec<BitmexL2Level> = self
            .call_json(HttpMethod::Get, "/orderBook/L2", query, Params::new(), false)
            .await?;
        Ok(depth_from_levels(levels, self.config.price_quote))
    }

    async fn index(&self) -> AdapterResult<Decimal> {
        let inst = self.instrument().await?;
        inst.indicative_settle_price
            .and_then(|p| self.config.price_quote.apply(p))
            .ok_or_else(|| AdapterError::NotFound(format!("index price for {}", self.config.symbol)))
    }

    async fn balance(&self) -> AdapterResult<Balance> {
        let query = params([("currency", "XBt".to_string())]);
        let margin: BitmexMargin = self
            .call_json(HttpMethod::Get, "/user/margin", query, Params::new(), true)
            .await?;
        Ok(margin.into())
    }

    async fn position(&self) -> AdapterResult<(Position, Position)> {
        let filter = serde_json::json!({ "symbol": self.config.symbol.as_str() }).to_string();
        let query = params([("filter", filter)]);
        let rows: Vec<BitmexPosition> = self
            .call_json(HttpMethod::Get, "/position", query, Params::new(), true)
            .await?;
        Ok(positions_from_rows(
            rows,
            self.config.symbol.as_str(),
            self.config.price_quote,
        ))
    }
}
