// src/common/db_utils.rs

use crate::common::error::AppError;

// ---
// Helper de unicidade: o índice único do banco é a guarda final.
// ---
/// Converte um `sqlx::Error` de violação de unicidade no mesmo erro de domínio
/// que a verificação prévia do serviço teria devolvido.
///
/// Cada query só toca um índice único, por isso `on_unique` não precisa de saber
/// qual foi violado. Qualquer outro erro vira `DatabaseError`.
pub(crate) fn map_unique_violation<F>(e: sqlx::Error, on_unique: F) -> AppError
where
    F: FnOnce() -> AppError,
{
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return on_unique();
        }
    }
    e.into()
}

// SQLSTATE 22003: numeric_value_out_of_range
const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// Um total de pontos que não cabe em INTEGER vira `PointsOutOfRange`,
/// o mesmo erro do store em memória.
pub(crate) fn map_points_out_of_range(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE) {
            return AppError::PointsOutOfRange;
        }
    }
    e.into()
}

/// Soma pontos sem transbordar; usado pelo store em memória.
pub(crate) fn add_points_checked(total: i32, delta: i32) -> Result<i32, AppError> {
    total.checked_add(delta).ok_or(AppError::PointsOutOfRange)
}

/// Mensagem usada quando dois pedidos concorrentes criam o mesmo curso.
pub(crate) fn duplicate_course_code(code: &str) -> AppError {
    AppError::DuplicateCode(format!("Já existe um curso com o código: {}", code))
}

pub(crate) fn duplicate_discipline_code(code: &str) -> AppError {
    AppError::DuplicateCode(format!("Já existe uma disciplina com o código: {}", code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_sum_refuses_to_overflow() {
        assert_eq!(add_points_checked(10, 5).unwrap(), 15);
        assert_eq!(add_points_checked(15, -5).unwrap(), 10);
        assert!(matches!(add_points_checked(i32::MAX, 1), Err(AppError::PointsOutOfRange)));
        assert!(matches!(add_points_checked(i32::MIN, -1), Err(AppError::PointsOutOfRange)));
    }

    #[test]
    fn non_database_errors_pass_through_as_database_errors() {
        let err = map_unique_violation(sqlx::Error::RowNotFound, || AppError::DuplicateName);
        assert!(matches!(err, AppError::DatabaseError(_)));
        let err = map_points_out_of_range(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::DatabaseError(_)));
    }
}
