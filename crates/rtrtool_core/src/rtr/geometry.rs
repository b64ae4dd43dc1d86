use cgmath::{InnerSpace, Vector2, Vector3, Zero};

const EPSILON: f32 = 1e-12;

/// Per-vertex normals from area-weighted face normals.
///
/// Each triangle adds its unnormalised cross product to its three corners, so
/// larger faces weigh more. Vertices touched by no face get `+Z`.
pub fn compute_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
	let mut sums = vec![Vector3::<f32>::zero(); positions.len()];
	for tri in indices.chunks_exact(3) {
		let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
		let p0 = Vector3::from(positions[a]);
		let p1 = Vector3::from(positions[b]);
		let p2 = Vector3::from(positions[c]);
		let face = (p1 - p0).cross(p2 - p0);
		sums[a] += face;
		sums[b] += face;
		sums[c] += face;
	}

	sums.into_iter()
		.map(|sum| if sum.magnitude2() > EPSILON { sum.normalize().into() } else { [0.0, 0.0, 1.0] })
		.collect()
}

/// Per-vertex tangents with handedness in `w`.
///
/// Accumulates per-triangle UV-gradient tangents and bitangents, then
/// Gram-Schmidt orthogonalises each tangent against its normal. `w` is `-1`
/// when the accumulated bitangent points against `normal x tangent`.
pub fn compute_tangents(positions: &[[f32; 3]], normals: &[[f32; 3]], tex_coords: &[[f32; 2]], indices: &[u32]) -> Vec<[f32; 4]> {
	let mut tangents = vec![Vector3::<f32>::zero(); positions.len()];
	let mut bitangents = vec![Vector3::<f32>::zero(); positions.len()];

	for tri in indices.chunks_exact(3) {
		let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
		let pos0 = Vector3::from(positions[a]);
		let pos1 = Vector3::from(positions[b]);
		let pos2 = Vector3::from(positions[c]);
		let uv0 = Vector2::from(tex_coords[a]);
		let uv1 = Vector2::from(tex_coords[b]);
		let uv2 = Vector2::from(tex_coords[c]);

		let delta_pos1 = pos1 - pos0;
		let delta_pos2 = pos2 - pos0;
		let delta_uv1 = uv1 - uv0;
		let delta_uv2 = uv2 - uv0;

		let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
		if det.abs() <= EPSILON {
			continue;
		}
		let r = 1.0 / det;
		let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;
		let bitangent = (delta_pos2 * delta_uv1.x - delta_pos1 * delta_uv2.x) * r;

		for corner in [a, b, c] {
			tangents[corner] += tangent;
			bitangents[corner] += bitangent;
		}
	}

	tangents
		.into_iter()
		.zip(bitangents)
		.zip(normals)
		.map(|((tangent, bitangent), normal)| {
			let normal = Vector3::from(*normal);
			let ortho = tangent - normal * normal.dot(tangent);
			let ortho = if ortho.magnitude2() > EPSILON { ortho.normalize() } else { any_perpendicular(normal) };
			let w = if normal.cross(ortho).dot(bitangent) < 0.0 { -1.0 } else { 1.0 };
			[ortho.x, ortho.y, ortho.z, w]
		})
		.collect()
}

fn any_perpendicular(normal: Vector3<f32>) -> Vector3<f32> {
	let axis = if normal.x.abs() < 0.9 { Vector3::unit_x() } else { Vector3::unit_y() };
	let ortho = axis - normal * normal.dot(axis);
	if ortho.magnitude2() > EPSILON { ortho.normalize() } else { Vector3::unit_x() }
}
