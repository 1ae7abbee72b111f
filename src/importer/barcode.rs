// ==========================================
// 钢卷库区管理系统 - 钢卷条码解析
// ==========================================
// 格式:
// - 简单条码: "24AC40001"
// - 复合条码: "24AC40001 3.6X1250X1500 23.6" (钢卷号 厚X宽X外径 重量)
// ==========================================

use serde::Serialize;

/// 复合条码解析结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedBarcode {
    pub coil_id: String,
    pub thickness_mm: Option<f64>,
    pub width_mm: Option<f64>,
    pub diameter_mm: Option<f64>,
    pub weight_tons: f64,
}

/// 提取钢卷号（首个空白分隔段）
///
/// # 返回
/// - None: 空串或全空白
pub fn coil_id_from_barcode(raw: &str) -> Option<String> {
    raw.split_whitespace().next().map(|s| s.to_string())
}

/// 解析复合条码
///
/// # 返回
/// - None: 少于两段,或最后一段不是数值
pub fn parse_complex_barcode(raw: &str) -> Option<ParsedBarcode> {
    let parts: Vec<&str> = raw.split_whitespace().collect();
    if parts.len() < 2 {
        return None;
    }

    let weight_tons = parts[parts.len() - 1].parse::<f64>().ok()?;

    // 尺寸段三项须全部为数值,否则整体忽略
    let dims: Option<Vec<f64>> = parts
        .iter()
        .find(|p| p.contains('X'))
        .and_then(|p| p.split('X').map(|d| d.parse::<f64>().ok()).collect());
    let (thickness_mm, width_mm, diameter_mm) = match dims.as_deref() {
        Some([t, w, d]) => (Some(*t), Some(*w), Some(*d)),
        _ => (None, None, None),
    };

    Some(ParsedBarcode {
        coil_id: parts[0].to_string(),
        thickness_mm,
        width_mm,
        diameter_mm,
        weight_tons,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coil_id_from_barcode() {
        assert_eq!(coil_id_from_barcode("  24AC40001  ").as_deref(), Some("24AC40001"));
        assert_eq!(
            coil_id_from_barcode("24AC40001 3.6X1250X1500 23.6").as_deref(),
            Some("24AC40001")
        );
        assert_eq!(coil_id_from_barcode("   "), None);
    }

    #[test]
    fn test_parse_complex_barcode() {
        let parsed = parse_complex_barcode("24AC40001 3.6X1250X1500 23.6").unwrap();
        assert_eq!(parsed.coil_id, "24AC40001");
        assert_eq!(parsed.thickness_mm, Some(3.6));
        assert_eq!(parsed.width_mm, Some(1250.0));
        assert_eq!(parsed.diameter_mm, Some(1500.0));
        assert_eq!(parsed.weight_tons, 23.6);

        // 尺寸段不完整: 仅保留钢卷号与重量
        let partial = parse_complex_barcode("24AC40001 3.6X1250 23.6").unwrap();
        assert_eq!(partial.thickness_mm, None);
        assert_eq!(partial.weight_tons, 23.6);

        assert!(parse_complex_barcode("24AC40001").is_none());
        assert!(parse_complex_barcode("24AC40001 3.6X1250X1500 heavy").is_none());
    }
}
