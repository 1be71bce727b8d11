//! Property names of every object kind, parsed once at the boundary.

use crate::settings::named_enum;

named_enum! {
    pub enum ObjectKind {
        Stochast => "stochast",
        DiscreteValue => "discrete_value",
        HistogramValue => "histogram_value",
        FragilityValue => "fragility_value",
        ConditionalValue => "conditional_value",
        ContributingStochast => "contributing_stochast",
        CorrelationMatrix => "correlation_matrix",
        SelfCorrelationMatrix => "self_correlation_matrix",
        Settings => "settings",
        StochastSettings => "stochast_settings",
        UncertaintySettings => "uncertainty_settings",
        SensitivitySettings => "sensitivity_settings",
        LimitStateFunction => "limit_state_function",
        Project => "project",
        UncertaintyProject => "uncertainty_project",
        SensitivityProject => "sensitivity_project",
        CombineProject => "combine_project",
        LengthEffectProject => "length_effect_project",
        DesignPoint => "design_point",
        Alpha => "alpha",
        Realization => "realization",
    }
}

named_enum! {
    pub enum StochastKey {
        Name => "name",
        Distribution => "distribution",
        Mean => "mean",
        Deviation => "deviation",
        Variation => "variation",
        Location => "location",
        Scale => "scale",
        Shift => "shift",
        ShiftB => "shift_b",
        Minimum => "minimum",
        Maximum => "maximum",
        Shape => "shape",
        ShapeB => "shape_b",
        Rate => "rate",
        Observations => "observations",
        ConstantParameter => "constant_parameter",
        Inverted => "inverted",
        Truncated => "truncated",
        DesignFraction => "design_fraction",
        DesignFactor => "design_factor",
        DesignValue => "design_value",
        IsArray => "is_array",
        ArraySize => "array_size",
        ArrayVariables => "array_variables",
        Conditional => "conditional",
        ConditionalSource => "conditional_source",
        ConditionalValues => "conditional_values",
        ContributingStochasts => "contributing_stochasts",
        DiscreteValues => "discrete_values",
        HistogramValues => "histogram_values",
        FragilityValues => "fragility_values",
        IsValid => "is_valid",
        /// Set only: fit the distribution to the given values.
        Fit => "fit",
        /// Evaluated at an argument.
        Pdf => "pdf",
        Cdf => "cdf",
        XFromU => "x_from_u",
        UFromX => "u_from_x",
        Quantile => "quantile",
    }
}

named_enum! {
    pub enum ValueKey {
        X => "x",
        Amount => "amount",
        LowerBound => "lower_bound",
        UpperBound => "upper_bound",
        ReliabilityIndex => "reliability_index",
        Probability => "probability",
        Variable => "variable",
        Location => "location",
        Scale => "scale",
        Shift => "shift",
        ShiftB => "shift_b",
        Minimum => "minimum",
        Maximum => "maximum",
        Shape => "shape",
        ShapeB => "shape_b",
    }
}

named_enum! {
    pub enum CorrelationKey {
        Correlation => "correlation",
        CorrelationType => "correlation_type",
        Clayton => "clayton",
        Frank => "frank",
        Gumbel => "gumbel",
    }
}

named_enum! {
    pub enum SettingsKey {
        ReliabilityMethod => "reliability_method",
        UncertaintyMethod => "uncertainty_method",
        SensitivityMethod => "sensitivity_method",
        StartMethod => "start_method",
        DesignPointMethod => "design_point_method",
        MinimumSamples => "minimum_samples",
        MaximumSamples => "maximum_samples",
        MinimumIterations => "minimum_iterations",
        MaximumIterations => "maximum_iterations",
        MinimumDirections => "minimum_directions",
        MaximumDirections => "maximum_directions",
        VariationCoefficient => "variation_coefficient",
        EpsilonBeta => "epsilon_beta",
        RelaxationFactor => "relaxation_factor",
        RelaxationLoops => "relaxation_loops",
        GradientType => "gradient_type",
        GradientStep => "gradient_step",
        AllQuadrants => "all_quadrants",
        MaxStepsSphereSearch => "max_steps_sphere_search",
        FractionFailed => "fraction_failed",
        MaximumLoops => "maximum_loops",
        Du => "du",
        MaximumLength => "maximum_length",
        EpsilonU => "epsilon_u",
        BatchSize => "batch_size",
        RandomType => "random_type",
        RandomSeed => "random_seed",
        IsRepeatableRandom => "is_repeatable_random",
        MaxParallelProcesses => "max_parallel_processes",
        SaveRealizations => "save_realizations",
        StochastSettings => "stochast_settings",
        Quantiles => "quantiles",
        DeriveSamplesFromVariationCoefficient => "derive_samples_from_variation_coefficient",
        CalculateCorrelations => "calculate_correlations",
        CalculateInputCorrelations => "calculate_input_correlations",
        Thresholds => "thresholds",
        HistogramBins => "histogram_bins",
        LowProbability => "low_probability",
        HighProbability => "high_probability",
    }
}

named_enum! {
    pub enum StochastSettingsKey {
        Variable => "variable",
        MinValue => "min_value",
        MaxValue => "max_value",
        StartValue => "start_value",
        VarianceFactor => "variance_factor",
        Intervals => "intervals",
        IsInitializationAllowed => "is_initialization_allowed",
        IsVarianceAllowed => "is_variance_allowed",
    }
}

named_enum! {
    pub enum LimitStateKey {
        Parameter => "parameter",
        Index => "index",
        CompareType => "compare_type",
        CriticalValue => "critical_value",
        CriticalParameter => "critical_parameter",
    }
}

named_enum! {
    pub enum ProjectKey {
        Variables => "variables",
        CorrelationMatrix => "correlation_matrix",
        SelfCorrelationMatrix => "self_correlation_matrix",
        Settings => "settings",
        LimitStateFunction => "limit_state_function",
        Output => "output",
        OutputIndex => "output_index",
        ReuseCalculations => "reuse_calculations",
        TotalModelRuns => "total_model_runs",
        IsValid => "is_valid",
        Messages => "messages",
        DesignPoint => "design_point",
        Stochast => "stochast",
        OutputStochasts => "output_stochasts",
        OutputCorrelationMatrix => "output_correlation_matrix",
        QuantileValues => "quantile_values",
        Outputs => "outputs",
        Low => "low",
        Medium => "medium",
        High => "high",
        FirstOrderIndex => "first_order_index",
        TotalIndex => "total_index",
    }
}

named_enum! {
    pub enum CombineKey {
        DesignPoints => "design_points",
        CrossSection => "cross_section",
        SelfCorrelationMatrix => "self_correlation_matrix",
        CorrelationLengths => "correlation_lengths",
        CombinerMethod => "combiner_method",
        CombineType => "combine_type",
        MinimumSamples => "minimum_samples",
        MaximumSamples => "maximum_samples",
        MinimumDirections => "minimum_directions",
        MaximumDirections => "maximum_directions",
        VariationCoefficient => "variation_coefficient",
        RandomSeed => "random_seed",
        Length => "length",
        SectionLength => "section_length",
        IsValid => "is_valid",
        Messages => "messages",
        DesignPoint => "design_point",
    }
}

named_enum! {
    pub enum DesignPointKey {
        Identifier => "identifier",
        ReliabilityIndex => "reliability_index",
        ProbabilityFailure => "probability_failure",
        Convergence => "convergence",
        IsConverged => "is_converged",
        TotalDirections => "total_directions",
        TotalIterations => "total_iterations",
        TotalModelRuns => "total_model_runs",
        Alphas => "alphas",
        ContributingDesignPoints => "contributing_design_points",
        Realizations => "realizations",
        Messages => "messages",
    }
}

named_enum! {
    pub enum AlphaKey {
        Variable => "variable",
        Name => "name",
        Index => "index",
        Alpha => "alpha",
        AlphaCorrelated => "alpha_correlated",
        InfluenceFactor => "influence_factor",
        X => "x",
        U => "u",
    }
}

named_enum! {
    pub enum RealizationKey {
        Iteration => "iteration",
        Z => "z",
        Beta => "beta",
        Weight => "weight",
        InputValues => "input_values",
        OutputValues => "output_values",
    }
}

named_enum! {
    /// Zero-argument methods.
    pub enum Method {
        Run => "run",
        Validate => "validate",
        InitializeConditionalValues => "initialize_conditional_values",
        ClearValidate => "clear_validate",
    }
}
