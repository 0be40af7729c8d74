//! Mapping between engine types and the wire types of `api_types`.

use api_types::{
    Currency as ApiCurrency,
    fee::{FeeStatus as ApiFeeStatus, FeeView},
    profile::ProfileView,
    report as api_report,
    session::{Role as ApiRole, View as ApiView},
    transaction::{
        TransactionKind as ApiKind, TransactionStatus as ApiStatus, TransactionView,
    },
    wallet::{WalletAuditView, WalletEntryView, WalletView},
};
use engine::{
    Currency, FeeStatus, FinancialTransaction, Profile, Role, StudentFee, Summary, Totals,
    TransactionKind, TransactionStatus, View, WalletAudit, WalletBalance, WalletEntry,
};

pub(crate) fn currency(value: Currency) -> ApiCurrency {
    match value {
        Currency::Omr => ApiCurrency::Omr,
        Currency::Usd => ApiCurrency::Usd,
        Currency::Eur => ApiCurrency::Eur,
    }
}

pub(crate) fn role(value: Role) -> ApiRole {
    match value {
        Role::Admin => ApiRole::Admin,
        Role::Teacher => ApiRole::Teacher,
        Role::Parent => ApiRole::Parent,
        Role::Student => ApiRole::Student,
        Role::Driver => ApiRole::Driver,
        Role::Finance => ApiRole::Finance,
        Role::Canteen => ApiRole::Canteen,
    }
}

pub(crate) fn role_from_api(value: ApiRole) -> Role {
    match value {
        ApiRole::Admin => Role::Admin,
        ApiRole::Teacher => Role::Teacher,
        ApiRole::Parent => Role::Parent,
        ApiRole::Student => Role::Student,
        ApiRole::Driver => Role::Driver,
        ApiRole::Finance => Role::Finance,
        ApiRole::Canteen => Role::Canteen,
    }
}

pub(crate) fn view(value: View) -> ApiView {
    match value {
        View::Dashboard => ApiView::Dashboard,
        View::Profiles => ApiView::Profiles,
        View::Finance => ApiView::Finance,
        View::Transactions => ApiView::Transactions,
        View::Fees => ApiView::Fees,
        View::Teachers => ApiView::Teachers,
        View::Students => ApiView::Students,
        View::Buses => ApiView::Buses,
        View::Routes => ApiView::Routes,
        View::Wallet => ApiView::Wallet,
        View::Meals => ApiView::Meals,
        View::Schedule => ApiView::Schedule,
        View::Reports => ApiView::Reports,
    }
}

pub(crate) fn kind(value: TransactionKind) -> ApiKind {
    match value {
        TransactionKind::Income => ApiKind::Income,
        TransactionKind::Expense => ApiKind::Expense,
    }
}

pub(crate) fn kind_from_api(value: ApiKind) -> TransactionKind {
    match value {
        ApiKind::Income => TransactionKind::Income,
        ApiKind::Expense => TransactionKind::Expense,
    }
}

pub(crate) fn status(value: TransactionStatus) -> ApiStatus {
    match value {
        TransactionStatus::Pending => ApiStatus::Pending,
        TransactionStatus::Completed => ApiStatus::Completed,
        TransactionStatus::Cancelled => ApiStatus::Cancelled,
    }
}

pub(crate) fn status_from_api(value: ApiStatus) -> TransactionStatus {
    match value {
        ApiStatus::Pending => TransactionStatus::Pending,
        ApiStatus::Completed => TransactionStatus::Completed,
        ApiStatus::Cancelled => TransactionStatus::Cancelled,
    }
}

pub(crate) fn profile(value: Profile) -> ProfileView {
    ProfileView {
        id: value.id,
        full_name: value.full_name,
        full_name_localized: value.full_name_localized,
        email: value.email,
        phone: value.phone,
        role: role(value.role),
        card_ids: value.card_ids,
        created_at: value.created_at,
        updated_at: value.updated_at,
    }
}

pub(crate) fn wallet(value: WalletBalance) -> WalletView {
    WalletView {
        profile_id: value.profile_id,
        balance_minor: value.balance_minor,
        currency: currency(value.currency),
        updated_at: value.updated_at,
    }
}

pub(crate) fn wallet_entry(value: WalletEntry) -> WalletEntryView {
    WalletEntryView {
        id: value.id,
        amount_minor: value.amount_minor,
        balance_after_minor: value.balance_after_minor,
        currency: currency(value.currency),
        description: value.description,
        financial_transaction_id: value.financial_transaction_id,
        created_at: value.created_at,
    }
}

pub(crate) fn wallet_audit(value: WalletAudit) -> WalletAuditView {
    WalletAuditView {
        profile_id: value.profile_id,
        stored_minor: value.stored_minor,
        replayed_minor: value.replayed_minor,
        entries: value.entries,
        consistent: value.consistent,
    }
}

pub(crate) fn transaction(value: FinancialTransaction) -> TransactionView {
    TransactionView {
        id: value.id,
        kind: kind(value.kind),
        category: value.category,
        amount_minor: value.amount_minor,
        currency: currency(value.currency),
        profile_id: value.profile_id,
        description: value.description,
        documents: value.documents,
        status: status(value.status),
        created_by: value.created_by,
        occurred_at: value.occurred_at,
        created_at: value.created_at,
        wallet_transaction_id: value.wallet_transaction_id,
    }
}

pub(crate) fn fee(value: StudentFee) -> FeeView {
    let status = match value.status() {
        FeeStatus::Unpaid => ApiFeeStatus::Unpaid,
        FeeStatus::Partial => ApiFeeStatus::Partial,
        FeeStatus::Paid => ApiFeeStatus::Paid,
    };
    FeeView {
        id: value.id,
        profile_id: value.profile_id,
        title: value.title.clone(),
        amount_minor: value.amount_minor,
        paid_minor: value.paid_minor,
        outstanding_minor: value.outstanding_minor(),
        currency: currency(value.currency),
        status,
        due_date: value.due_date,
        created_at: value.created_at,
    }
}

fn totals(value: Totals) -> api_report::Totals {
    api_report::Totals {
        revenue_minor: value.revenue_minor,
        expenses_minor: value.expenses_minor,
        net_minor: value.net_minor,
    }
}

pub(crate) fn summary(value: Summary) -> api_report::Summary {
    api_report::Summary {
        currency: currency(value.currency),
        totals: totals(value.totals),
        by_category: value
            .by_category
            .into_iter()
            .map(|(key, value)| (key, totals(value)))
            .collect(),
        by_month: value
            .by_month
            .into_iter()
            .map(|(key, value)| (key, totals(value)))
            .collect(),
        fees: api_report::FeeTotals {
            due_minor: value.fees.due_minor,
            paid_minor: value.fees.paid_minor,
            outstanding_minor: value.fees.outstanding_minor,
        },
    }
}

pub(crate) fn list_filter(
    value: &api_types::transaction::TransactionList,
) -> engine::TransactionListFilter {
    engine::TransactionListFilter {
        kind: value.kind.map(kind_from_api),
        status: value.status.map(status_from_api),
        profile_id: value.profile_id,
        category: value.category.clone(),
        from: value.from.map(|at| at.with_timezone(&chrono::Utc)),
        to: value.to.map(|at| at.with_timezone(&chrono::Utc)),
    }
}
