//! Send/receive round trip over an in-memory endpoint with validation and extraction.
use ironcheck::prelude::*;
use std::time::Duration;
use tracing::{error, info};

const RECEIVE_TIMEOUT: Duration = Duration::from_secs(1);

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .try_init();
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let orchestrator = EngineBuilder::new()
        .with_config(ValidationConfig::new().with_header_name_ignore_case(true))
        .build();
    let endpoint = DirectEndpoint::new("direct:hello");

    let mut context = orchestrator.create_context();
    context.set_variable("operation", "sayHello");
    context.set_variable("myText", "Hello World!");

    let outbound = ControlMessageBuilder::new()
        .with_payload(
            "<TestRequest><Id>citrus:randomNumber(6)</Id><Message>${myText}</Message></TestRequest>",
        )
        .with_header("Operation", "${operation}");
    let sent = send_message(&endpoint, &orchestrator, &outbound, None, &context).await?;
    info!("Sent {}", sent.payload_str()?);

    let request = ValidationRequest::builder()
        .payload("<TestRequest><Id>@isNumber()@</Id><Message>${myText}</Message></TestRequest>")
        .header("operation", "${operation}")
        .extract(VariableExtractor::new().with_path("/TestRequest/Id", "requestId"))
        .build();

    match receive_and_validate(
        &endpoint,
        Some("Operation = '${operation}'"),
        RECEIVE_TIMEOUT,
        &orchestrator,
        &request,
        &mut context,
    )
    .await
    {
        Ok(_) => info!("Validation passed, requestId={}", context.get_variable("requestId")?),
        Err(e) => error!("Validation failed: {}", e),
    }

    let unexpected = ValidationRequest::builder()
        .payload("<TestRequest><Id>@ignore@</Id><Message>Goodbye</Message></TestRequest>")
        .build();
    endpoint.send(sent).await?;
    if let Err(e) = receive_and_validate(
        &endpoint,
        None,
        RECEIVE_TIMEOUT,
        &orchestrator,
        &unexpected,
        &mut context,
    )
    .await
    {
        info!("Expected failure: {}", e);
    }
    Ok(())
}
