use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The six BRT web services this client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    TrackingById,
    IdByRmn,
    IdByRma,
    IdByParcel,
    StatusLegend,
    EventLegend,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::TrackingById,
        Operation::IdByRmn,
        Operation::IdByRma,
        Operation::IdByParcel,
        Operation::StatusLegend,
        Operation::EventLegend,
    ];

    /// Configuration key under `[wsdl]` / `[locations]`.
    pub fn key(self) -> &'static str {
        match self {
            Operation::TrackingById => "tracking_by_id",
            Operation::IdByRmn => "id_by_rmn",
            Operation::IdByRma => "id_by_rma",
            Operation::IdByParcel => "id_by_collo",
            Operation::StatusLegend => "legenda_esiti",
            Operation::EventLegend => "legenda_eventi",
        }
    }

    /// Remote RPC operation name.
    pub fn rpc_name(self) -> &'static str {
        match self {
            Operation::TrackingById => "BRT_TrackingByBRTshipmentID",
            Operation::IdByRmn => "GetIdSpedizioneByRMN",
            Operation::IdByRma => "GetIdSpedizioneByRMA",
            Operation::IdByParcel => "GetIdSpedizioneByIdCollo",
            Operation::StatusLegend => "GetLegendaEsiti",
            Operation::EventLegend => "GetLegendaEventi",
        }
    }
}

/// Where the service definition document is read from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DefinitionSource {
    Remote(String),
    /// Locally cached copy with https addressing.
    Cached(PathBuf),
}

impl std::fmt::Display for DefinitionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefinitionSource::Remote(url) => write!(f, "{}", url),
            DefinitionSource::Cached(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    pub operation_key: String,
    pub definition: DefinitionSource,
    /// Overrides the address embedded in the definition when present.
    pub invocation_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Text(String),
    Int(i64),
}

impl ArgValue {
    pub fn as_wire(&self) -> String {
        match self {
            ArgValue::Text(s) => s.clone(),
            ArgValue::Int(i) => i.to_string(),
        }
    }
}

/// One remote call: the operation name plus the fields of its single
/// wrapped `arg0` structure, in wire order.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcRequest {
    pub operation: &'static str,
    pub fields: Vec<(&'static str, ArgValue)>,
}

impl RpcRequest {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            fields: Vec::new(),
        }
    }

    pub fn text(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.fields.push((name, ArgValue::Text(value.into())));
        self
    }

    pub fn int(mut self, name: &'static str, value: i64) -> Self {
        self.fields.push((name, ArgValue::Int(value)));
        self
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryInfo {
    pub requested_date: Option<String>,
    pub theoretical_date: Option<String>,
    pub delivered_date: Option<String>,
    pub requested_time_from: Option<String>,
    pub requested_time_to: Option<String>,
    pub requested_type: Option<String>,
    pub signer: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SenderInfo {
    pub code: Option<String>,
    pub name: Option<String>,
    pub zip: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub province: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipientInfo {
    pub name: Option<String>,
    pub zip: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub province: Option<String>,
    pub country: Option<String>,
    pub contact: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoodsInfo {
    pub parcels: i64,
    pub nature: Option<String>,
    pub weight_kg: f64,
    pub volume_m3: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashOnDeliveryInfo {
    pub currency: Option<String>,
    pub amount: Option<f64>,
    pub collection: Option<String>,
    pub particulars: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsuranceInfo {
    pub currency: Option<String>,
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: Option<String>,
    pub branch: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShipmentRecord {
    pub id: Option<String>,
    /// Raw shipment date as sent by BRT.
    pub date: Option<String>,
    pub primary_status: Option<String>,
    pub secondary_status: Option<String>,
    pub delivery: DeliveryInfo,
    pub sender: SenderInfo,
    pub recipient: RecipientInfo,
    pub goods: GoodsInfo,
    pub cash_on_delivery: CashOnDeliveryInfo,
    pub insurance: InsuranceInfo,
    pub events: Vec<EventRecord>,
    pub notes: Vec<NoteRecord>,
}

const SHIPMENT_DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%Y%m%d"];

impl ShipmentRecord {
    pub fn shipment_date(&self) -> Option<NaiveDate> {
        let raw = self.date.as_deref()?.trim();
        SHIPMENT_DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentIdLookup {
    pub year: i32,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLegendEntry {
    pub id: i64,
    pub text1: String,
    pub text2: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLegendEntry {
    pub id: String,
    pub description: String,
}
