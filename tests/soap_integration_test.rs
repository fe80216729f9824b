use brt_tracking::core::invoker::TransportSettings;
use brt_tracking::core::{RpcRequest, RpcTransport, ServiceEndpoint};
use brt_tracking::domain::model::DefinitionSource;
use brt_tracking::{BrtConfig, BrtError, BrtTrackingClient, SoapInvoker};
use httpmock::prelude::*;
use std::collections::HashMap;
use std::time::Duration;

fn definition(address: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<definitions xmlns="http://schemas.xmlsoap.org/wsdl/" xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/" targetNamespace="http://wsr.brt.it/">
  <service name="GetIdSpedizioneByRMAService">
    <port name="GetIdSpedizioneByRMAPort">
      <soap:address location="{}"/>
    </port>
  </service>
</definitions>"#,
        address
    )
}

const RMA_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<S:Envelope xmlns:S="http://schemas.xmlsoap.org/soap/envelope/">
  <S:Body>
    <ns2:GetIdSpedizioneByRMAResponse xmlns:ns2="http://wsr.brt.it/">
      <return>
        <ESITO>0</ESITO>
        <SPEDIZIONE_ID>00000000000</SPEDIZIONE_ID>
      </return>
    </ns2:GetIdSpedizioneByRMAResponse>
  </S:Body>
</S:Envelope>"#;

const FAULT_RESPONSE: &str = r#"<S:Envelope xmlns:S="http://schemas.xmlsoap.org/soap/envelope/">
  <S:Body>
    <S:Fault>
      <faultcode>S:Server</faultcode>
      <faultstring>java.lang.NullPointerException</faultstring>
    </S:Fault>
  </S:Body>
</S:Envelope>"#;

fn plain_http() -> TransportSettings {
    TransportSettings {
        timeout: Duration::from_secs(5),
        https_only: false,
    }
}

fn stub_config(server: &MockServer) -> BrtConfig {
    BrtConfig {
        client_id: Some("0000000".to_string()),
        https_only: false,
        cache_wsdl_locally: false,
        wsdl: HashMap::from([("id_by_rma".to_string(), server.url("/rma.wsdl"))]),
        locations: HashMap::new(),
        ..BrtConfig::default()
    }
}

#[tokio::test]
async fn test_rma_lookup_over_soap() {
    let server = MockServer::start_async().await;

    let wsdl_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/rma.wsdl");
            then.status(200).body(definition(&server.url("/rma")));
        })
        .await;

    let call_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/rma")
                .header("SOAPAction", "\"\"")
                .body_contains("<ns:GetIdSpedizioneByRMA><arg0>")
                .body_contains("<CLIENTE_ID>0000000</CLIENTE_ID>")
                .body_contains(
                    "<RIFERIMENTO_MITTENTE_ALFABETICO>OLP000000000000</RIFERIMENTO_MITTENTE_ALFABETICO>",
                );
            then.status(200)
                .header("Content-Type", "text/xml; charset=utf-8")
                .body(RMA_RESPONSE);
        })
        .await;

    let client = BrtTrackingClient::from_config(&stub_config(&server));

    let id = client.shipment_id_by_rma("OLP000000000000").await.unwrap();
    assert_eq!(id, "00000000000");

    // the definition is parsed once per invoker
    let id = client.shipment_id_by_rma("OLP000000000000").await.unwrap();
    assert_eq!(id, "00000000000");

    wsdl_mock.assert_hits_async(1).await;
    call_mock.assert_hits_async(2).await;
}

#[tokio::test]
async fn test_configured_location_overrides_definition_address() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/rma.wsdl");
            then.status(200)
                .body(definition("http://127.0.0.1:9/unreachable"));
        })
        .await;
    let call_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/override");
            then.status(200).body(RMA_RESPONSE);
        })
        .await;

    let mut config = stub_config(&server);
    config
        .locations
        .insert("id_by_rma".to_string(), server.url("/override"));

    let id = BrtTrackingClient::from_config(&config)
        .shipment_id_by_rma("OLP000000000000")
        .await
        .unwrap();

    assert_eq!(id, "00000000000");
    call_mock.assert_async().await;
}

#[tokio::test]
async fn test_soap_fault_becomes_transport_error() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/rma.wsdl");
            then.status(200).body(definition(&server.url("/rma")));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/rma");
            then.status(500).body(FAULT_RESPONSE);
        })
        .await;

    let err = BrtTrackingClient::from_config(&stub_config(&server))
        .shipment_id_by_rma("OLP000000000000")
        .await
        .unwrap_err();

    assert!(
        matches!(err, BrtError::Transport { ref message } if message.contains("NullPointerException")),
        "unexpected error: {:?}",
        err
    );
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_http_error_without_fault_is_transport_error() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/rma.wsdl");
            then.status(200).body(definition(&server.url("/rma")));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/rma");
            then.status(503).body("Service Unavailable");
        })
        .await;

    let err = BrtTrackingClient::from_config(&stub_config(&server))
        .shipment_id_by_rma("OLP000000000000")
        .await
        .unwrap_err();

    assert!(matches!(err, BrtError::Transport { ref message } if message.contains("503")));
}

#[tokio::test]
async fn test_service_rejection_is_an_outcome_error() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/rma.wsdl");
            then.status(200).body(definition(&server.url("/rma")));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/rma");
            then.status(200).body(
                r#"<S:Envelope xmlns:S="http://schemas.xmlsoap.org/soap/envelope/"><S:Body><ns2:GetIdSpedizioneByRMAResponse xmlns:ns2="http://wsr.brt.it/"><return><ESITO>-22</ESITO></return></ns2:GetIdSpedizioneByRMAResponse></S:Body></S:Envelope>"#,
            );
        })
        .await;

    let err = BrtTrackingClient::from_config(&stub_config(&server))
        .shipment_id_by_rma("OLP000000000000")
        .await
        .unwrap_err();

    assert_eq!(err.code(), Some(-22));
    assert_eq!(err.to_string(), "Multiple shipments found");
}

#[tokio::test]
async fn test_unreachable_definition_is_transport_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/rma.wsdl");
            then.status(404);
        })
        .await;

    let endpoint = ServiceEndpoint {
        operation_key: "id_by_rma".to_string(),
        definition: DefinitionSource::Remote(server.url("/rma.wsdl")),
        invocation_address: None,
    };
    let result = SoapInvoker::new(plain_http())
        .call(&endpoint, &RpcRequest::new("GetIdSpedizioneByRMA"))
        .await;

    tokio_test::assert_err!(&result);
    assert!(matches!(result, Err(BrtError::Transport { .. })));
}
