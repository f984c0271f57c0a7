use crate::models::*;
use crate::services::PacketService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/packets",
    tag = "packet",
    request_body = CreatePacketRequest,
    responses(
        (status = 200, description = "发红包成功", body = PacketResponse),
        (status = 400, description = "金额/份数不合法或余额不足")
    )
)]
/// 发红包:
/// 1. 校验总额能覆盖每份最低金额
/// 2. 扣减发送者余额并写入 Active 红包 (同一事务)
pub async fn create_packet(
    service: web::Data<PacketService>,
    request: web::Json<CreatePacketRequest>,
) -> Result<HttpResponse> {
    match service.create_packet(request.into_inner()).await {
        Ok(packet) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": packet }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/packets/{packet_no}/grab",
    tag = "packet",
    params(
        ("packet_no" = String, Path, description = "红包编号")
    ),
    request_body = GrabRequest,
    responses(
        (status = 200, description = "抢到红包", body = GrabResponse),
        (status = 404, description = "红包不存在"),
        (status = 409, description = "已领完 / 已过期 / 已领取过 / 已关闭")
    )
)]
/// 抢红包。竞争失败按原因返回不同的错误码:
/// PACKET_EXHAUSTED / PACKET_EXPIRED / ALREADY_CLAIMED / PACKET_CLOSED
pub async fn grab_packet(
    service: web::Data<PacketService>,
    path: web::Path<String>,
    request: web::Json<GrabRequest>,
) -> Result<HttpResponse> {
    let packet_no = path.into_inner();
    match service.grab(&packet_no, request.claimant_id).await {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": result }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/packets/{packet_no}/revoke",
    tag = "packet",
    params(
        ("packet_no" = String, Path, description = "红包编号")
    ),
    request_body = RevokeRequest,
    responses(
        (status = 200, description = "撤回成功, 剩余金额已退回", body = RevokeResponse),
        (status = 403, description = "非发送者"),
        (status = 409, description = "红包已不是 Active 状态")
    )
)]
/// 撤回红包 (仅发送者, 仅 Active 状态)
pub async fn revoke_packet(
    service: web::Data<PacketService>,
    path: web::Path<String>,
    request: web::Json<RevokeRequest>,
) -> Result<HttpResponse> {
    let packet_no = path.into_inner();
    match service.revoke(&packet_no, request.requester_id).await {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": result }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/packets/{packet_no}",
    tag = "packet",
    params(
        ("packet_no" = String, Path, description = "红包编号")
    ),
    responses(
        (status = 200, description = "红包快照与领取列表", body = PacketDetailResponse),
        (status = 404, description = "红包不存在")
    )
)]
/// 查询红包状态与领取记录 (只读)
pub async fn get_packet(
    service: web::Data<PacketService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let packet_no = path.into_inner();
    match service.get_packet_state(&packet_no).await {
        Ok(detail) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": detail }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn packet_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/packets")
            .route("", web::post().to(create_packet))
            .route("/{packet_no}", web::get().to(get_packet))
            .route("/{packet_no}/grab", web::post().to(grab_packet))
            .route("/{packet_no}/revoke", web::post().to(revoke_packet)),
    );
}
