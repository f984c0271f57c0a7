use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::packet::create_packet,
        handlers::packet::grab_packet,
        handlers::packet::revoke_packet,
        handlers::packet::get_packet,
        handlers::wallet::get_wallet,
        handlers::wallet::get_ledger,
    ),
    components(
        schemas(
            PacketPolicy,
            PacketStatus,
            CreatePacketRequest,
            GrabRequest,
            RevokeRequest,
            PacketResponse,
            GrabResponse,
            RevokeResponse,
            ClaimResponse,
            PacketDetailResponse,
            LedgerReason,
            WalletResponse,
            LedgerEntryResponse,
        )
    ),
    tags(
        (name = "packet", description = "红包发放与领取"),
        (name = "wallet", description = "钱包与流水")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );
}
