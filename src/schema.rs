diesel::table! {
    portfolios (id) {
        id -> Text,
        name -> Text,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    funds (id) {
        id -> Text,
        portfolio_id -> Text,
        name -> Text,
        status -> Text,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    fund_valuations (id) {
        id -> Text,
        fund_id -> Text,
        valuation_date -> Date,
        amount -> Text,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    fund_irr_values (id) {
        id -> Text,
        fund_id -> Text,
        irr_date -> Date,
        irr_result -> Double,
        fund_valuation_id -> Nullable<Text>,
        calculated_at -> Text,
    }
}

diesel::table! {
    portfolio_valuations (id) {
        id -> Text,
        portfolio_id -> Text,
        valuation_date -> Date,
        amount -> Text,
        calculated_at -> Text,
    }
}

diesel::table! {
    portfolio_irr_values (id) {
        id -> Text,
        portfolio_id -> Text,
        irr_date -> Date,
        irr_result -> Double,
        portfolio_valuation_id -> Nullable<Text>,
        calculated_at -> Text,
    }
}

diesel::table! {
    activities (id) {
        id -> Text,
        fund_id -> Text,
        activity_type -> Text,
        activity_date -> Date,
        amount -> Text,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::joinable!(funds -> portfolios (portfolio_id));
diesel::joinable!(fund_valuations -> funds (fund_id));
diesel::joinable!(fund_irr_values -> funds (fund_id));
diesel::joinable!(portfolio_valuations -> portfolios (portfolio_id));
diesel::joinable!(portfolio_irr_values -> portfolios (portfolio_id));
diesel::joinable!(activities -> funds (fund_id));

diesel::allow_tables_to_appear_in_same_query!(
    portfolios,
    funds,
    fund_valuations,
    fund_irr_values,
    portfolio_valuations,
    portfolio_irr_values,
    activities,
);
