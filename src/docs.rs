// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::auth::update_role,

        // --- Catalog ---
        handlers::catalog::list_products,
        handlers::catalog::get_product,
        handlers::catalog::create_product,
        handlers::catalog::update_product,
        handlers::catalog::delete_product,
        handlers::catalog::bulk_update_products,
        handlers::catalog::list_categories,
        handlers::catalog::create_category,
        handlers::catalog::create_review,

        // --- Inventory ---
        handlers::inventory::adjust_stock,
        handlers::inventory::list_movements,

        // --- Customers ---
        handlers::customers::list_customers,
        handlers::customers::create_customer,

        // --- Sales ---
        handlers::sales::create_sale,
        handlers::sales::list_sales,
        handlers::sales::list_my_sales,
        handlers::sales::get_sale,
        handlers::sales::link_user,

        // --- Returns ---
        handlers::returns::create_return,
        handlers::returns::list_returns,
        handlers::returns::update_return_status,

        // --- Expenses ---
        handlers::expenses::list_expenses,
        handlers::expenses::create_expense,

        // --- Analytics ---
        handlers::analytics::get_summary,
        handlers::analytics::get_sales_by_day,
        handlers::analytics::get_top_products,
        handlers::analytics::get_low_stock,
        handlers::analytics::get_financial_report,

        // --- Settings ---
        handlers::settings::get_settings,
        handlers::settings::update_settings,
        handlers::settings::list_activity_logs,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::UpdateRolePayload,
            models::auth::AuthResponse,

            // --- Catalog ---
            models::catalog::ProductImage,
            models::catalog::Category,
            models::catalog::Product,
            models::catalog::ProductView,
            models::catalog::ProductInput,
            models::catalog::BulkUpdateInput,
            models::catalog::Review,
            models::catalog::CategoryInput,
            models::catalog::ReviewInput,
            handlers::catalog::BulkUpdateResponse,

            // --- Inventory ---
            models::inventory::StockMovementReason,
            models::inventory::StockMovement,
            models::inventory::AdjustStockPayload,

            // --- Customers ---
            models::customer::Customer,
            models::customer::CustomerInput,

            // --- Sales ---
            models::sale::Sale,
            models::sale::SaleItem,
            models::sale::SaleDetail,
            models::sale::SaleLineInput,
            models::sale::CreateSalePayload,
            models::sale::LinkUserPayload,

            // --- Returns ---
            models::returns::ReturnStatus,
            models::returns::Return,
            models::returns::ReturnItem,
            models::returns::ReturnDetail,
            models::returns::ReturnLineInput,
            models::returns::CreateReturnPayload,
            models::returns::UpdateReturnStatusPayload,

            // --- Expenses ---
            models::expense::Expense,
            models::expense::ExpenseInput,

            // --- Analytics ---
            models::analytics::SalesSummary,
            models::analytics::DailySales,
            models::analytics::TopProduct,
            models::analytics::CategoryTotal,
            models::analytics::FinancialReport,

            // --- Settings ---
            models::settings::StoreSettings,
            models::settings::UpdateSettingsRequest,
            models::activity::ActivityLog,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário e Perfil"),
        (name = "Catalog", description = "Produtos, Categorias e Avaliações"),
        (name = "Inventory", description = "Ajustes e Movimentações de Estoque"),
        (name = "Customers", description = "Cadastro de Clientes"),
        (name = "Sales", description = "Frente de Caixa"),
        (name = "Returns", description = "Devoluções e Reembolsos"),
        (name = "Expenses", description = "Despesas da Loja"),
        (name = "Analytics", description = "Indicadores e Relatórios Gerenciais"),
        (name = "Settings", description = "Configurações da Loja e Auditoria")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_sale_and_return_routes() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/api/sales"));
        assert!(paths.contains_key("/api/returns/{id}"));
        assert!(paths.contains_key("/api/reports/financial"));
    }
}
