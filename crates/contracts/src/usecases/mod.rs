pub mod u501_reconcile_store_orders;
