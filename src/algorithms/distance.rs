//! Distance between two fixes on the WGS84 ellipsoid
//!
//! Platform providers report ellipsoidal distances (Vincenty's inverse
//! formula), so the same is computed here. Nearly antipodal pairs where the
//! iteration does not converge fall back to the spherical haversine distance.

use crate::core::{LocationFix, EARTH_FLATTENING_WGS84, EARTH_MEAN_RADIUS_M, EARTH_RADIUS_WGS84};

const MAX_ITERATIONS: usize = 200;
const CONVERGENCE_THRESHOLD: f64 = 1e-12;

/// Distance between two fixes in meters
pub fn distance(from: &LocationFix, to: &LocationFix) -> f64 {
    vincenty_distance(from.latitude, from.longitude, to.latitude, to.longitude)
        .unwrap_or_else(|| haversine_distance(from.latitude, from.longitude, to.latitude, to.longitude))
}

/// Great-circle distance on a sphere of mean earth radius (meters)
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_MEAN_RADIUS_M * c
}

/// Ellipsoidal distance via Vincenty's inverse formula (meters)
///
/// Returns `None` when the iteration fails to converge.
pub fn vincenty_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Option<f64> {
    let a = EARTH_RADIUS_WGS84;
    let f = EARTH_FLATTENING_WGS84;
    let b = a * (1.0 - f);

    let l = (lon2 - lon1).to_radians();
    let u1 = ((1.0 - f) * lat1.to_radians().tan()).atan();
    let u2 = ((1.0 - f) * lat2.to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    for _ in 0..MAX_ITERATIONS {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
        .sqrt();

        // coincident points
        if sin_sigma == 0.0 {
            return Some(0.0);
        }

        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        let sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        // equatorial line: cos_sq_alpha = 0
        let cos_2sigma_m = if cos_sq_alpha != 0.0 {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        } else {
            0.0
        };
        let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));

        let lambda_prev = lambda;
        lambda = l
            + (1.0 - c)
                * f
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

        if (lambda - lambda_prev).abs() < CONVERGENCE_THRESHOLD {
            let u_sq = cos_sq_alpha * (a * a - b * b) / (b * b);
            let big_a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
            let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
            let delta_sigma = big_b
                * sin_sigma
                * (cos_2sigma_m
                    + big_b / 4.0
                        * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)
                            - big_b / 6.0
                                * cos_2sigma_m
                                * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                                * (-3.0 + 4.0 * cos_2sigma_m * cos_2sigma_m)));

            return Some(b * big_a * (sigma - delta_sigma));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn fix(lat: f64, lon: f64) -> LocationFix {
        LocationFix::new(lat, lon, Utc::now())
    }

    #[test]
    fn test_identical_points() {
        let a = fix(42.6977, 23.3219);
        assert_eq!(distance(&a, &a), 0.0);
    }

    #[test]
    fn test_one_degree_of_longitude_on_equator() {
        let d = distance(&fix(0.0, 0.0), &fix(0.0, 1.0));
        // a * pi / 180
        assert!((d - 111_319.49).abs() < 0.1, "got {}", d);
    }

    #[test]
    fn test_berlin_paris() {
        let berlin = fix(52.5200, 13.4050);
        let paris = fix(48.8566, 2.3522);
        let d = distance(&berlin, &paris);
        assert!((d - 878_000.0).abs() < 5_000.0, "got {}", d);
        assert!((d - distance(&paris, &berlin)).abs() < 1e-3);
    }

    #[test]
    fn test_haversine_close_to_vincenty() {
        let d_sphere = haversine_distance(52.5200, 13.4050, 48.8566, 2.3522);
        let d_ellipsoid = vincenty_distance(52.5200, 13.4050, 48.8566, 2.3522).unwrap();
        // spherical model is within 0.5%
        assert!((d_sphere - d_ellipsoid).abs() / d_ellipsoid < 0.005);
    }

    #[test]
    fn test_antipodal_falls_back() {
        let d = distance(&fix(0.0, 0.0), &fix(0.5, 179.7));
        assert!(d.is_finite());
        assert!(d > 19_000_000.0);
    }
}
