// ==========================================
// 钢卷库区管理系统 - 命令行入口
// ==========================================
// 用法: coil-yard [db_path]
// 职责: 初始化数据库并输出库区概况（占用、待倒垛、未对账盘点）
// ==========================================

use std::error::Error;
use std::sync::{Arc, Mutex};

use coil_yard::api::YardApi;
use coil_yard::db::{default_db_path, init_schema, open_sqlite_connection, read_schema_version};
use coil_yard::domain::{CoilStatus, StockTakeStatus};
use coil_yard::{i18n, logging};

fn main() -> Result<(), Box<dyn Error>> {
    logging::init();
    i18n::init_from_env();

    tracing::info!("==================================================");
    tracing::info!("{}", coil_yard::APP_NAME);
    tracing::info!("系统版本: {}", coil_yard::VERSION);
    tracing::info!("==================================================");

    let db_path = std::env::args().nth(1).unwrap_or_else(default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    let schema_version = read_schema_version(&conn)?;
    let api = YardApi::from_connection(Arc::new(Mutex::new(conn)))?;

    let repos = api.repositories();
    let coils = repos.coils.list()?;
    let positions = repos.positions.list()?;
    let locations = repos.locations.list()?;

    println!("{} v{}", coil_yard::APP_NAME, coil_yard::VERSION);
    println!("数据库: {} (schema v{})", db_path, schema_version.unwrap_or(0));
    println!(
        "地面库位: {}  堆垛库位: {}  钢卷: {}",
        locations.len(),
        positions.len(),
        coils.len()
    );

    println!("--- 分层占用 ---");
    for layer in api.layer_occupancy(None)? {
        println!("  L{}: {}/{}", layer.layer, layer.occupied, layer.total);
    }

    println!("--- 钢卷状态 ---");
    for status in [
        CoilStatus::Incoming,
        CoilStatus::InYard,
        CoilStatus::InProcess,
        CoilStatus::Outgoing,
        CoilStatus::Shipped,
    ] {
        let count = coils.iter().filter(|c| c.status == status).count();
        println!("  {:<10} {}", status.as_str(), count);
    }

    let now = chrono::Utc::now().naive_utc();
    let candidates = api.shuffle_candidates(now)?;
    let urgent: Vec<_> = candidates.iter().filter(|c| c.needs_shuffle).collect();
    println!("--- 待倒垛: {} ---", urgent.len());
    for candidate in urgent.iter().take(10) {
        println!(
            "  {:<14} 评分 {:>3}  在库 {:>3} 天",
            candidate.coil_barcode, candidate.score, candidate.days_in_yard
        );
    }

    let open_stock_takes = api
        .list_stock_takes()?
        .into_iter()
        .filter(|st| st.status != StockTakeStatus::Reconciled)
        .count();
    println!("--- 未对账盘点单: {} ---", open_stock_takes);

    Ok(())
}
