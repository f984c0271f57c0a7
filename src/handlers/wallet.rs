use crate::models::*;
use crate::services::LedgerService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/wallet/{user_id}",
    tag = "wallet",
    params(
        ("user_id" = i64, Path, description = "账户ID")
    ),
    responses(
        (status = 200, description = "余额快照", body = WalletResponse),
        (status = 404, description = "账户不存在")
    )
)]
/// 查询账户余额
pub async fn get_wallet(
    service: web::Data<LedgerService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    match service.get_wallet(user_id).await {
        Ok(wallet) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": wallet }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/wallet/{user_id}/ledger",
    tag = "wallet",
    params(
        ("user_id" = i64, Path, description = "账户ID"),
        PageQuery
    ),
    responses(
        (status = 200, description = "流水分页 (倒序)")
    )
)]
/// 分页查询账户流水 (倒序)
pub async fn get_ledger(
    service: web::Data<LedgerService>,
    path: web::Path<i64>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    match service.list_entries(user_id, &query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": page }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn wallet_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/wallet")
            .route("/{user_id}", web::get().to(get_wallet))
            .route("/{user_id}/ledger", web::get().to(get_ledger)),
    );
}
