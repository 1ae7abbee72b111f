// ==========================================
// 钢卷库区管理系统 - 演示库区生成
// ==========================================
// 用法: seed_yard_db [db_path] [coil_count]
// 内容:
// - 跨 A / 区 Z1: 3×4 地面库位 A-01..A-12
// - 每个地面库位一个 L1 库位; 同行相邻两库位之间一个 L2 跨接库位
// - 钢卷先放满地面层,再放跨接层,余下保持待入库
// ==========================================

use chrono::{Duration, Utc};
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use coil_yard::api::YardApi;
use coil_yard::config::EngineConfig;
use coil_yard::db::{default_db_path, init_schema, open_sqlite_connection};
use coil_yard::domain::{Coil, CoilPriority, GroundLocation, StackingPosition};
use coil_yard::engine::layout::{suggest_placeholder_id, LocationGridSpec};
use coil_yard::engine::YardRepositories;
use coil_yard::importer::parse_complex_barcode;
use coil_yard::logging;

const BAY: &str = "A";
const ZONE: &str = "Z1";
const DEFAULT_COIL_COUNT: usize = 24;

fn main() -> Result<(), Box<dyn Error>> {
    logging::init();

    let db_path = std::env::args().nth(1).unwrap_or_else(default_db_path);
    let coil_count = std::env::args()
        .nth(2)
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_COIL_COUNT);

    backup_and_reset_db(&db_path)?;

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    let repos = YardRepositories::sqlite(Arc::new(Mutex::new(conn)));
    let api = YardApi::new(repos.clone(), EngineConfig::default()).with_actor("seed");

    let locations = api.create_ground_locations(&LocationGridSpec {
        prefix: format!("{}-", BAY),
        start: 1,
        end: 12,
        digits: 2,
        rows: 3,
        cols: 4,
        bay: BAY.to_string(),
        zone: ZONE.to_string(),
        capacity_tons: 60.0,
    })?;

    let ground_ids = seed_ground_positions(&api, &locations)?;
    let bridge_ids = seed_bridging_positions(&api, &locations)?;
    let placed = seed_coils(&api, &repos, coil_count, &ground_ids, &bridge_ids)?;

    println!("数据库: {}", db_path);
    println!(
        "地面库位 {} / L1 库位 {} / L2 库位 {} / 钢卷 {} (已入位 {})",
        locations.len(),
        ground_ids.len(),
        bridge_ids.len(),
        coil_count,
        placed
    );
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if path.exists() {
        let backup = format!("{}.bak", db_path);
        fs::rename(path, &backup)?;
        tracing::info!("已备份旧数据库: {}", backup);
    }
    Ok(())
}

fn seed_ground_positions(
    api: &YardApi,
    locations: &[GroundLocation],
) -> Result<Vec<String>, Box<dyn Error>> {
    let mut ids = Vec::with_capacity(locations.len());
    for location in locations {
        let placeholder = suggest_placeholder_id(&location.location_code, 1);
        let position = api.create_position(StackingPosition::ground(&placeholder, &location.id, BAY, ZONE))?;
        ids.push(position.id);
    }
    Ok(ids)
}

/// 同一行左右相邻的两个地面库位共同承托一个 L2 库位
fn seed_bridging_positions(
    api: &YardApi,
    locations: &[GroundLocation],
) -> Result<Vec<String>, Box<dyn Error>> {
    let mut ids = Vec::new();
    for left in locations {
        let right = locations.iter().find(|l| {
            l.row_num == left.row_num
                && matches!((l.col_num, left.col_num), (Some(r), Some(c)) if r == c + 1)
        });
        let Some(right) = right else { continue };

        let placeholder = suggest_placeholder_id(&left.location_code, 2);
        let position = api.create_position(StackingPosition::bridging(
            &placeholder,
            2,
            &left.id,
            &[&left.id, &right.id],
            BAY,
            ZONE,
        ))?;
        ids.push(position.id);
    }
    Ok(ids)
}

fn seed_coils(
    api: &YardApi,
    repos: &YardRepositories,
    coil_count: usize,
    ground_ids: &[String],
    bridge_ids: &[String],
) -> Result<usize, Box<dyn Error>> {
    let now = Utc::now().naive_utc();
    let priorities = [
        None,
        Some(CoilPriority::Low),
        Some(CoilPriority::Medium),
        Some(CoilPriority::High),
        Some(CoilPriority::Urgent),
    ];

    let mut placed = 0;
    let targets: Vec<&String> = ground_ids.iter().chain(bridge_ids.iter()).collect();

    for i in 0..coil_count {
        let raw = format!(
            "24AC4{:04} {:.1}X{}X1500 {:.1}",
            i + 1,
            2.0 + (i % 5) as f64 * 0.4,
            1000 + (i % 4) * 125,
            18.0 + (i % 7) as f64 * 1.5
        );
        let Some(parsed) = parse_complex_barcode(&raw) else { continue };

        let mut coil = Coil::incoming(&parsed.coil_id, parsed.weight_tons);
        coil.thickness_mm = parsed.thickness_mm;
        coil.width_mm = parsed.width_mm;
        coil.diameter_mm = parsed.diameter_mm;
        coil.priority = priorities[i % priorities.len()];
        coil.received_date = Some(now - Duration::days((i as i64 * 3) % 45));
        repos.coils.create(coil)?;

        // 地面层先于跨接层,保证放入时下层已满
        if let Some(target) = targets.get(i) {
            api.assign(&parsed.coil_id, target)?;
            placed += 1;
        }
    }
    Ok(placed)
}
