//! Raw response → typed records.
//!
//! Every function here is total: missing groups and fields turn into
//! `None`, empty lists or zero counts, never into an error.

use crate::domain::model::{
    CashOnDeliveryInfo, DeliveryInfo, EventLegendEntry, EventRecord, GoodsInfo, InsuranceInfo,
    NoteRecord, RecipientInfo, SenderInfo, ShipmentIdLookup, ShipmentRecord, StatusLegendEntry,
};
use serde_json::Value;

static EMPTY: Value = Value::Null;

fn group<'a>(parent: &'a Value, key: &str) -> &'a Value {
    parent.get(key).unwrap_or(&EMPTY)
}

fn text(parent: &Value, key: &str) -> Option<String> {
    match parent.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn number(parent: &Value, key: &str) -> Option<f64> {
    match parent.get(key)? {
        Value::Number(n) => n.as_f64(),
        // BRT sends decimals with either separator
        Value::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

fn integer(parent: &Value, key: &str) -> Option<i64> {
    match parent.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// A repeated element comes back as an array, a lone one as an object.
fn rows(parent: &Value, key: &str) -> Vec<Value> {
    match parent.get(key) {
        Some(Value::Array(items)) => items.clone(),
        Some(item @ Value::Object(_)) => vec![item.clone()],
        _ => Vec::new(),
    }
}

/// Event and note lists may be wrapped (`LISTA_EVENTI/EVENTO`) or bare.
fn list_items(parent: &Value, list_key: &str, item_key: &str) -> Vec<Value> {
    match parent.get(list_key) {
        Some(list @ Value::Object(map)) if map.contains_key(item_key) => rows(list, item_key),
        Some(_) => rows(parent, list_key),
        None => Vec::new(),
    }
}

pub fn shipment(response: &Value) -> ShipmentRecord {
    let bolla = group(response, "BOLLA");
    let ds = group(bolla, "DATI_SPEDIZIONE");
    let dc = group(bolla, "DATI_CONSEGNA");
    let mitt = group(bolla, "MITTENTE");
    let dest = group(bolla, "DESTINATARIO");
    let merce = group(bolla, "MERCE");
    let cod = group(bolla, "CONTRASSEGNO");
    let ass = group(bolla, "ASSICURAZIONE");

    let events = list_items(bolla, "LISTA_EVENTI", "EVENTO")
        .iter()
        .map(|e| EventRecord {
            id: text(e, "ID"),
            branch: text(e, "FILIALE"),
            date: text(e, "DATA"),
            time: text(e, "ORA"),
            description: text(e, "DESCRIZIONE"),
        })
        .collect();

    let notes = list_items(bolla, "LISTA_NOTE", "NOTA")
        .iter()
        .map(|n| NoteRecord {
            description: text(n, "DESCRIZIONE"),
        })
        .collect();

    ShipmentRecord {
        id: text(ds, "SPEDIZIONE_ID"),
        date: text(ds, "SPEDIZIONE_DATA"),
        primary_status: text(ds, "STATO_SPED_PARTE1"),
        secondary_status: text(ds, "STATO_SPED_PARTE2"),
        delivery: DeliveryInfo {
            requested_date: text(dc, "DATA_CONS_RICHIESTA"),
            theoretical_date: text(dc, "DATA_TEORICA_CONSEGNA"),
            delivered_date: text(dc, "DATA_CONSEGNA_MERCE"),
            requested_time_from: text(dc, "ORA_TEORICA_CONSEGNA_DA"),
            requested_time_to: text(dc, "ORA_TEORICA_CONSEGNA_A"),
            requested_type: text(dc, "TIPO_CONS_RICHIESTA"),
            signer: text(dc, "FIRMATARIO_CONSEGNA"),
        },
        sender: SenderInfo {
            code: text(mitt, "CODICE"),
            name: text(mitt, "RAGIONE_SOCIALE"),
            zip: text(mitt, "CAP"),
            city: text(mitt, "LOCALITA"),
            address: text(mitt, "INDIRIZZO"),
            province: text(mitt, "SIGLA_AREA"),
        },
        recipient: RecipientInfo {
            name: text(dest, "RAGIONE_SOCIALE"),
            zip: text(dest, "CAP"),
            city: text(dest, "LOCALITA"),
            address: text(dest, "INDIRIZZO"),
            province: text(dest, "SIGLA_PROVINCIA"),
            country: text(dest, "SIGLA_NAZIONE"),
            contact: text(dest, "REFERENTE_CONSEGNA"),
            phone: text(dest, "TELEFONO_REFERENTE"),
        },
        goods: GoodsInfo {
            parcels: integer(merce, "COLLI").unwrap_or(0),
            nature: text(merce, "NATURA_MERCE"),
            weight_kg: number(merce, "PESO_KG").unwrap_or(0.0),
            volume_m3: number(merce, "VOLUME_M3").unwrap_or(0.0),
        },
        cash_on_delivery: CashOnDeliveryInfo {
            currency: text(cod, "CONTRASSEGNO_DIVISA"),
            amount: number(cod, "CONTRASSEGNO_IMPORTO"),
            collection: text(cod, "CONTRASSEGNO_INCASSO"),
            particulars: text(cod, "CONTRASSEGNO_PARTICOLARITA"),
        },
        insurance: InsuranceInfo {
            currency: text(ass, "ASSICURAZIONE_DIVISA"),
            amount: number(ass, "ASSICURAZIONE_IMPORTO"),
        },
        events,
        notes,
    }
}

pub fn shipment_id(response: &Value) -> String {
    text(response, "SPEDIZIONE_ID").unwrap_or_default()
}

pub fn shipment_id_lookup(response: &Value) -> ShipmentIdLookup {
    ShipmentIdLookup {
        year: integer(response, "SPEDIZIONE_ANNO")
            .and_then(|y| i32::try_from(y).ok())
            .unwrap_or(0),
        id: shipment_id(response),
    }
}

/// Raw legend rows of one page, as received.
pub fn legend_rows(response: &Value) -> Vec<Value> {
    rows(response, "LEGENDA")
}

pub fn status_legend_key(row: &Value) -> Option<i64> {
    integer(row, "ID")
}

pub fn event_legend_key(row: &Value) -> Option<String> {
    text(row, "ID")
}

pub fn status_legend_entry(row: &Value) -> Option<StatusLegendEntry> {
    let Some(id) = status_legend_key(row) else {
        tracing::warn!("Skipping status legend row without numeric ID: {}", row);
        return None;
    };
    Some(StatusLegendEntry {
        id,
        text1: text(row, "TESTO1").unwrap_or_default(),
        text2: text(row, "TESTO2"),
    })
}

pub fn event_legend_entry(row: &Value) -> Option<EventLegendEntry> {
    let Some(id) = event_legend_key(row) else {
        tracing::warn!("Skipping event legend row without ID: {}", row);
        return None;
    };
    Some(EventLegendEntry {
        id,
        description: text(row, "DESCRIZIONE").unwrap_or_default(),
    })
}
