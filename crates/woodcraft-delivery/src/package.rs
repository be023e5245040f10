//! Package sizing for courier requests.

use woodcraft_types::{CourierItem, Dimensions, ProductSpec, RequestedProduct};

const LENGTH_SPEC: &str = "chiều dài";
const WIDTH_SPEC: &str = "chiều rộng";
const HEIGHT_SPEC: &str = "chiều cao";

/// Package defaults applied when building courier requests.
#[derive(Debug, Clone)]
pub struct PackageSettings {
	/// Used for any axis that cannot be read from the product spec.
	pub default_dimension_cm: u32,
	/// Used when a product carries no weight.
	pub default_weight_grams: u32,
	pub service_type_id: u32,
	pub payment_type_id: u32,
	pub required_note: String,
}

impl Default for PackageSettings {
	fn default() -> Self {
		Self {
			default_dimension_cm: 20,
			default_weight_grams: 1_000,
			service_type_id: 2,
			payment_type_id: 1,
			required_note: "KHONGCHOXEMHANG".to_string(),
		}
	}
}

/// Parses one length such as `120`, `1,5 cm` or `75.2cm`, rounded up to
/// whole centimetres.
fn parse_length(raw: &str) -> Option<u32> {
	let lowered = raw.trim().to_lowercase();
	let number = lowered.strip_suffix("cm").unwrap_or(&lowered).trim();
	let value: f64 = number.replace(',', ".").parse().ok()?;
	if !value.is_finite() || value <= 0.0 {
		return None;
	}
	Some(value.ceil() as u32)
}

fn technical_length(spec: &ProductSpec, name: &str) -> Option<u32> {
	spec.technical_specs
		.iter()
		.find(|s| s.name.trim().to_lowercase() == name)
		.and_then(|s| parse_length(&s.value))
}

/// Reads package dimensions from a product spec.
///
/// The `"L x W x H"` variant value wins (separator `x`, `X` or `×`). An axis
/// missing there falls back to the `Chiều dài`/`Chiều rộng`/`Chiều cao`
/// technical spec, then to `default_cm` for that axis only.
pub fn extract_dimensions(spec: &ProductSpec, default_cm: u32) -> Dimensions {
	let variant: Vec<Option<u32>> = match &spec.variant_dimensions {
		Some(value) => {
			let parts: Vec<&str> = value
				.split(|c: char| c == 'x' || c == 'X' || c == '×')
				.collect();
			if parts.len() == 3 {
				parts.into_iter().map(parse_length).collect()
			} else {
				vec![None; 3]
			}
		},
		None => vec![None; 3],
	};

	let axis = |index: usize, name: &str| {
		variant[index]
			.or_else(|| technical_length(spec, name))
			.unwrap_or(default_cm)
	};

	Dimensions {
		length: axis(0, LENGTH_SPEC),
		width: axis(1, WIDTH_SPEC),
		height: axis(2, HEIGHT_SPEC),
	}
}

/// One courier item per product.
pub fn courier_item(product: &RequestedProduct, settings: &PackageSettings) -> CourierItem {
	let dimensions = extract_dimensions(&product.spec, settings.default_dimension_cm);
	CourierItem {
		name: product.name.clone(),
		code: product.product_id.clone(),
		quantity: product.quantity.max(1),
		length: dimensions.length,
		width: dimensions.width,
		height: dimensions.height,
		weight: product
			.spec
			.weight_grams
			.filter(|w| *w > 0)
			.unwrap_or(settings.default_weight_grams),
	}
}

/// Outer package of a set of items: the largest footprint, stacked heights
/// and the summed weight.
pub fn package_of(items: &[CourierItem], settings: &PackageSettings) -> (Dimensions, u32) {
	if items.is_empty() {
		let side = settings.default_dimension_cm;
		return (
			Dimensions {
				length: side,
				width: side,
				height: side,
			},
			settings.default_weight_grams,
		);
	}

	let length = items.iter().map(|i| i.length).max().unwrap_or(0);
	let width = items.iter().map(|i| i.width).max().unwrap_or(0);
	let height = items
		.iter()
		.map(|i| i.height.saturating_mul(i.quantity))
		.fold(0u32, u32::saturating_add);
	let weight = items
		.iter()
		.map(|i| i.weight.saturating_mul(i.quantity))
		.fold(0u32, u32::saturating_add);

	(
		Dimensions {
			length,
			width,
			height,
		},
		weight,
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use woodcraft_types::TechnicalSpec;

	fn spec(variant: Option<&str>, technical: &[(&str, &str)]) -> ProductSpec {
		ProductSpec {
			variant_dimensions: variant.map(str::to_string),
			technical_specs: technical
				.iter()
				.map(|(name, value)| TechnicalSpec {
					name: name.to_string(),
					value: value.to_string(),
				})
				.collect(),
			weight_grams: None,
		}
	}

	#[test]
	fn test_variant_dimensions_with_separators_and_decimals() {
		let dims = extract_dimensions(&spec(Some("120 x 60,5 X 75.2 cm"), &[]), 20);
		assert_eq!(
			dims,
			Dimensions {
				length: 120,
				width: 61,
				height: 76
			}
		);

		let dims = extract_dimensions(&spec(Some("40×30×10"), &[]), 20);
		assert_eq!(
			dims,
			Dimensions {
				length: 40,
				width: 30,
				height: 10
			}
		);
	}

	#[test]
	fn test_each_axis_falls_back_independently() {
		let dims = extract_dimensions(&spec(Some("120 x abc x 75"), &[]), 20);
		assert_eq!(
			dims,
			Dimensions {
				length: 120,
				width: 20,
				height: 75
			}
		);

		let dims = extract_dimensions(
			&spec(None, &[("Chiều dài", "180 cm"), ("Chiều cao", "không rõ")]),
			20,
		);
		assert_eq!(
			dims,
			Dimensions {
				length: 180,
				width: 20,
				height: 20
			}
		);
	}

	#[test]
	fn test_malformed_variant_uses_technical_specs() {
		let dims = extract_dimensions(
			&spec(Some("120x60"), &[("Chiều rộng", "45")]),
			25,
		);
		assert_eq!(
			dims,
			Dimensions {
				length: 25,
				width: 45,
				height: 25
			}
		);
	}

	#[test]
	fn test_package_stacks_items() {
		let settings = PackageSettings::default();
		let items = vec![
			CourierItem {
				name: "Bàn".into(),
				code: "p1".into(),
				quantity: 1,
				length: 120,
				width: 60,
				height: 75,
				weight: 15_000,
			},
			CourierItem {
				name: "Ghế".into(),
				code: "p2".into(),
				quantity: 2,
				length: 45,
				width: 45,
				height: 40,
				weight: 4_000,
			},
		];
		let (dims, weight) = package_of(&items, &settings);
		assert_eq!(
			dims,
			Dimensions {
				length: 120,
				width: 60,
				height: 155
			}
		);
		assert_eq!(weight, 23_000);
	}
}
