use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::util::{build_client, fetch_text};
use crate::core::config::CentralBankProviderConfig;
use crate::core::error::{FetchError, ParseError};
use crate::core::rate::{CurrencyPair, ProviderResult, RateSourceProvider, RawQuote};

pub const CENTRAL_BANK_ID: &str = "central_bank";

/// Daily bulletin published as one `Currency` element per currency, quoted in
/// the bank's home currency.
pub struct CentralBankXmlProvider {
    config: CentralBankProviderConfig,
    client: reqwest::Client,
}

impl CentralBankXmlProvider {
    pub fn new(config: CentralBankProviderConfig) -> Result<Self> {
        let client =
            build_client(&config.fetch).context("Failed to build central bank HTTP client")?;
        Ok(Self { config, client })
    }
}

#[derive(Debug, Deserialize)]
struct Bulletin {
    #[serde(rename = "Currency", default)]
    currencies: Vec<BulletinCurrency>,
}

#[derive(Debug, Deserialize)]
struct BulletinCurrency {
    #[serde(rename = "@Kod")]
    code: String,
    #[serde(rename = "Unit")]
    unit: Option<String>,
    #[serde(rename = "ForexSelling")]
    forex_selling: Option<String>,
    #[serde(rename = "BanknoteSelling")]
    banknote_selling: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Finds `code` in the bulletin and extracts its sell quote.
///
/// Forex selling wins; banknote selling is used only when forex is blank.
fn parse_bulletin(xml: &str, code: &str) -> Result<Option<RawQuote>, ParseError> {
    let bulletin: Bulletin =
        quick_xml::de::from_str(xml).map_err(|e| ParseError::Malformed(e.to_string()))?;

    let Some(currency) = bulletin.currencies.iter().find(|c| c.code == code) else {
        return Ok(None);
    };

    let raw = non_blank(&currency.forex_selling)
        .or_else(|| non_blank(&currency.banknote_selling))
        .ok_or_else(|| ParseError::MissingField(format!("ForexSelling/BanknoteSelling for {code}")))?;

    let unit_divisor = non_blank(&currency.unit)
        .and_then(|u| u.parse::<u32>().ok())
        .unwrap_or(1);

    Ok(Some(RawQuote::new(raw, unit_divisor, CENTRAL_BANK_ID)))
}

#[async_trait]
impl RateSourceProvider for CentralBankXmlProvider {
    fn id(&self) -> &str {
        CENTRAL_BANK_ID
    }

    #[instrument(name = "CentralBankFetch", skip(self), fields(pair = %pair))]
    async fn fetch(&self, pair: &CurrencyPair) -> ProviderResult {
        let xml = match fetch_text(&self.client, &self.config.url, &self.config.fetch).await {
            Ok(xml) => xml,
            Err(e) => return ProviderResult::Error(e),
        };

        match parse_bulletin(&xml, pair.from.as_str()) {
            Ok(Some(quote)) => {
                debug!(raw = %quote.raw, unit = quote.unit_divisor, "Parsed central bank quote");
                quote.normalize().map_err(FetchError::from).into()
            }
            Ok(None) => ProviderResult::NotFound,
            Err(e) => ProviderResult::Error(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::FetchSettings;
    use crate::core::rate::Rate;
    use rust_decimal_macros::dec;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BULLETIN: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Tarih_Date Tarih="17.10.2026" Date="10/17/2026" Bulten_No="2026/198">
    <Currency CrossOrder="0" Kod="USD" CurrencyCode="USD">
        <Unit>1</Unit>
        <Isim>ABD DOLARI</Isim>
        <CurrencyName>US DOLLAR</CurrencyName>
        <ForexBuying>41.0321</ForexBuying>
        <ForexSelling>41.1060</ForexSelling>
        <BanknoteBuying>41.0034</BanknoteBuying>
        <BanknoteSelling>41.1677</BanknoteSelling>
        <CrossRateUSD/>
        <CrossRateOther/>
    </Currency>
    <Currency CrossOrder="9" Kod="JPY" CurrencyCode="JPY">
        <Unit>100</Unit>
        <Isim>JAPON YENI</Isim>
        <CurrencyName>JAPENESE YEN</CurrencyName>
        <ForexBuying>27.1534</ForexBuying>
        <ForexSelling>27.3335</ForexSelling>
        <BanknoteBuying>27.0522</BanknoteBuying>
        <BanknoteSelling>27.5002</BanknoteSelling>
    </Currency>
    <Currency CrossOrder="17" Kod="KWD" CurrencyCode="KWD">
        <Unit>1</Unit>
        <Isim>KUVEYT DINARI</Isim>
        <CurrencyName>KUWAITI DINAR</CurrencyName>
        <ForexBuying>134.1204</ForexBuying>
        <ForexSelling></ForexSelling>
        <BanknoteBuying/>
        <BanknoteSelling>136.1322</BanknoteSelling>
    </Currency>
    <Currency CrossOrder="18" Kod="XDR" CurrencyCode="XDR">
        <Unit>1</Unit>
        <Isim>OZEL CEKME HAKKI (SDR)</Isim>
        <CurrencyName>SPECIAL DRAWING RIGHT (SDR)</CurrencyName>
        <ForexBuying>56.0311</ForexBuying>
        <ForexSelling/>
        <BanknoteBuying/>
        <BanknoteSelling/>
    </Currency>
</Tarih_Date>"#;

    async fn create_mock_server(status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/kurlar/today.xml"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    fn provider_for(mock_server: &MockServer) -> CentralBankXmlProvider {
        CentralBankXmlProvider::new(CentralBankProviderConfig {
            url: format!("{}/kurlar/today.xml", mock_server.uri()),
            fetch: FetchSettings::default(),
        })
        .unwrap()
    }

    fn pair(from: &str) -> CurrencyPair {
        CurrencyPair::new(from.parse().unwrap(), "TRY".parse().unwrap())
    }

    #[test]
    fn test_parse_prefers_forex_selling() {
        let quote = parse_bulletin(BULLETIN, "USD").unwrap().unwrap();
        assert_eq!(quote, RawQuote::new("41.1060", 1, CENTRAL_BANK_ID));
    }

    #[test]
    fn test_parse_falls_back_to_banknote_selling() {
        let quote = parse_bulletin(BULLETIN, "KWD").unwrap().unwrap();
        assert_eq!(quote.raw, "136.1322");
    }

    #[test]
    fn test_parse_reads_unit_divisor() {
        let quote = parse_bulletin(BULLETIN, "JPY").unwrap().unwrap();
        assert_eq!(quote.unit_divisor, 100);
    }

    #[test]
    fn test_parse_blank_sell_fields_is_an_error() {
        let err = parse_bulletin(BULLETIN, "XDR").unwrap_err();
        assert!(matches!(err, ParseError::MissingField(_)));
    }

    #[test]
    fn test_parse_unknown_currency_is_none() {
        assert!(parse_bulletin(BULLETIN, "BRL").unwrap().is_none());
    }

    #[test]
    fn test_parse_missing_unit_defaults_to_one() {
        let xml = r#"<Tarih_Date><Currency Kod="EUR"><ForexSelling>47.9153</ForexSelling></Currency></Tarih_Date>"#;
        let quote = parse_bulletin(xml, "EUR").unwrap().unwrap();
        assert_eq!(quote.unit_divisor, 1);
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let mock_server = create_mock_server(200, BULLETIN).await;
        let provider = provider_for(&mock_server);

        let result = provider.fetch(&pair("USD")).await;
        assert_eq!(
            result,
            ProviderResult::Success(Rate::new(dec!(41.1060)).unwrap())
        );
    }

    #[tokio::test]
    async fn test_fetch_scales_per_hundred_quote() {
        let mock_server = create_mock_server(200, BULLETIN).await;
        let provider = provider_for(&mock_server);

        match provider.fetch(&pair("JPY")).await {
            ProviderResult::Success(rate) => assert_eq!(rate.value(), dec!(0.273335)),
            other => panic!("Expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_unknown_currency_is_not_found() {
        let mock_server = create_mock_server(200, BULLETIN).await;
        let provider = provider_for(&mock_server);

        assert_eq!(provider.fetch(&pair("BRL")).await, ProviderResult::NotFound);
    }

    #[tokio::test]
    async fn test_fetch_malformed_xml_is_parse_error() {
        let mock_server = create_mock_server(200, "<Tarih_Date><Currency Kod=").await;
        let provider = provider_for(&mock_server);

        assert!(matches!(
            provider.fetch(&pair("USD")).await,
            ProviderResult::Error(FetchError::Parse(ParseError::Malformed(_)))
        ));
    }

    #[tokio::test]
    async fn test_fetch_server_error_is_transport_error() {
        let mock_server = create_mock_server(500, "").await;
        let provider = provider_for(&mock_server);

        assert!(matches!(
            provider.fetch(&pair("USD")).await,
            ProviderResult::Error(FetchError::Transport(_))
        ));
    }
}
