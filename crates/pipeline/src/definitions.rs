//! The three Silver tables kept in sync from the lake.

use crate::job::QueryJob;

const COMPANY_ID_BY_PRODUCTS_SQL: &str = include_str!("../sql/company_id_by_products.sql");
const RESERVATIONS_90D_SQL: &str = include_str!("../sql/reservations_90d_by_company.sql");
const BOOKING_ENGINES_SQL: &str = include_str!("../sql/booking_engines_with_pixel.sql");

pub const COMPANY_ID_BY_PRODUCTS: &str = "asksuite-salesops.Silver.company_id_by_products";
pub const RESERVATIONS_90D_BY_COMPANY: &str = "asksuite-salesops.Silver.Reservations_90d_by_Company";
pub const BOOKING_ENGINES_WITH_PIXEL: &str =
    "asksuite-salesops.Silver.motores_de_reserva_com_pixel_homologado";

/// The Silver jobs in run order. All share `output_location`.
pub fn silver_jobs(output_location: &str) -> Vec<QueryJob> {
    vec![
        QueryJob::new(
            "company_id_by_products",
            COMPANY_ID_BY_PRODUCTS_SQL.trim(),
            "datalake",
            output_location,
            COMPANY_ID_BY_PRODUCTS,
        ),
        QueryJob::new(
            "reservations_90d_by_company",
            RESERVATIONS_90D_SQL.trim(),
            "datalake",
            output_location,
            RESERVATIONS_90D_BY_COMPANY,
        ),
        QueryJob::new(
            "booking_engines_with_pixel",
            BOOKING_ENGINES_SQL.trim(),
            "asksuite_control",
            output_location,
            BOOKING_ENGINES_WITH_PIXEL,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_jobs_in_fixed_order() {
        let jobs = silver_jobs("s3://asksuite-athena-results/athena-temp/");
        let destinations: Vec<&str> = jobs.iter().map(|j| j.destination.as_str()).collect();
        assert_eq!(
            destinations,
            vec![
                COMPANY_ID_BY_PRODUCTS,
                RESERVATIONS_90D_BY_COMPANY,
                BOOKING_ENGINES_WITH_PIXEL,
            ]
        );

        let databases: Vec<&str> = jobs.iter().map(|j| j.database.as_str()).collect();
        assert_eq!(databases, vec!["datalake", "datalake", "asksuite_control"]);
        assert!(jobs
            .iter()
            .all(|j| j.output_location == "s3://asksuite-athena-results/athena-temp/"));
    }

    #[test]
    fn sql_is_embedded() {
        let jobs = silver_jobs("s3://b/p/");
        assert!(jobs[0].sql.starts_with("WITH w_askflow AS"));
        assert!(jobs[1].sql.contains("FROM asksuite_control.public_reservations"));
        assert!(jobs[2].sql.contains("motor_de_reservas"));
        assert!(jobs.iter().all(|j| !j.sql.ends_with(';')));
    }
}
