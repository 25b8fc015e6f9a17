use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{handlers, models, services};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::orders::cash_on_delivery,
        handlers::orders::order_list,
        handlers::orders::cancel_order,
        handlers::orders::delete_order,
        handlers::payments::checkout,
        handlers::payments::confirm_session,
        handlers::payments::gateway_webhook,
        handlers::dispatch::assign_order,
        handlers::dispatch::admin_orders,
        handlers::dispatch::admin_stats,
        handlers::dispatch::agent_orders,
        handlers::dispatch::agent_respond,
        handlers::dispatch::update_status,
    ),
    components(schemas(
        models::OrderStatus,
        models::AgentResponse,
        models::AgentDecision,
        services::orders::CreateOrderRequest,
        services::orders::CheckoutLine,
        services::orders::OrderResponse,
        services::orders::AddressSummary,
        services::orders::CustomerSummary,
        services::reconciliation::CheckoutSessionResponse,
        services::reconciliation::ConfirmSessionRequest,
        services::dispatch::AssignOrderRequest,
        services::dispatch::AgentResponseRequest,
        services::dispatch::UpdateProgressRequest,
        services::dispatch::AdminStats,
        handlers::orders::CancelOrderRequest,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "orders", description = "Customer order lifecycle"),
        (name = "payments", description = "Card checkout and reconciliation"),
        (name = "dispatch", description = "Assignment and delivery progress")
    ),
    info(
        title = "Storefront Order API",
        description = "Order lifecycle, payment reconciliation, and delivery dispatch"
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Swagger UI serving the generated document at `/docs`.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
